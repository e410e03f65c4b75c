#![allow(clippy::crate_in_macro_def)]

use ast::{At, Command, Commands, Declaration, Main, Parameter, Procedure, Program, Spanned};

macro_rules! output {
    ($input:expr) => {
        String::from_utf8($input.into_inner()?)?
    };
}

#[cfg_attr(test, macro_export)]
macro_rules! compile {
    (debug $program:expr) => {{
        let program = $program;
        let mut writer = std::io::BufWriter::new(Vec::new());
        let compiler = crate::Compiler::new(&program, Some(crate::CompilerConfig { debug: true }));
        compiler.compile()?.write(&mut writer)?;
        output!(writer)
    }};

    (result $program:expr) => {{
        let program = $program;
        crate::Compiler::new(&program, None).compile().map(|_| ())
    }};

    (run $program:expr, $input:expr) => {{
        crate::test::run(&$program, $input)?
    }};

    ($program:expr) => {{
        let program = $program;
        let mut writer = std::io::BufWriter::new(Vec::new());
        let compiler = crate::Compiler::new(&program, None);
        compiler.compile()?.write(&mut writer)?;
        output!(writer)
    }};
}

mod branching;

const STEP_LIMIT: u64 = 10_000_000;

/// Numbers the commands from line 1.
pub fn block(commands: Vec<Command>) -> Commands {
    commands
        .into_iter()
        .enumerate()
        .map(|(index, command)| command.at(index + 1))
        .collect()
}

pub fn declarations(declarations: Vec<Declaration>) -> Vec<Spanned<Declaration>> {
    declarations.into_iter().map(|d| d.at(1)).collect()
}

pub fn procedure(
    name: &str,
    parameters: Vec<Parameter>,
    locals: Vec<Declaration>,
    commands: Vec<Command>,
) -> Procedure {
    Procedure::new(
        String::from(name).at(1),
        parameters,
        declarations(locals),
        block(commands),
    )
}

pub fn program(
    procedures: Vec<Procedure>,
    variables: Vec<Declaration>,
    commands: Vec<Command>,
) -> Program {
    Program::new(procedures, Main::new(declarations(variables), block(commands)))
}

/// Compiles `program` and runs it on the reference machine, returning everything it wrote.
pub fn run(program: &Program, input: Vec<i64>) -> anyhow::Result<Vec<i64>> {
    let instructions = crate::Compiler::new(program, None).compile()?;
    let machine = vm::Machine::new(
        vm::TestingDevice::new(input),
        Some(vm::Config {
            step_limit: Some(STEP_LIMIT),
        }),
    );
    let outcome = machine.run(&instructions.program())?;
    Ok(outcome.device.output)
}
