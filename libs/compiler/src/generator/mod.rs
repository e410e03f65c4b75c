mod arithmetic;
mod control_flow;
mod procedures;
mod values;

use crate::symbol_table::{self, MAIN_SCOPE, SymbolTable};
use ast::{Command, Commands, Program, Value};
use il::{Address, Instruction, InstructionNode, Instructions, Target};
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Scope(#[from] symbol_table::Error),

    #[error("line {1}: procedure `{0}` is not declared before this call.")]
    UndeclaredProcedure(String, usize),

    #[error("line {line}: invalid call to `{procedure}`: {reason}.")]
    ArgumentMismatch {
        procedure: String,
        reason: String,
        line: usize,
    },

    #[error("line {1}: loop iterator `{0}` cannot be modified.")]
    IteratorMutation(String, usize),

    #[error(transparent)]
    Listing(#[from] il::Error),
}

impl Error {
    /// Source line the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Scope(e) => Some(e.line()),
            Error::UndeclaredProcedure(_, line)
            | Error::IteratorMutation(_, line)
            | Error::ArgumentMismatch { line, .. } => Some(*line),
            Error::Listing(_) => None,
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct CompilerConfig {
    /// Annotate the listing with `#` comments naming variables, calls and conditions.
    pub debug: bool,
}

/// What an arithmetic or comparison routine reads from. Lets the generator work over
/// compiler-owned cells without building tree nodes for them.
#[derive(Debug, Clone, Copy)]
enum Operand<'v> {
    Value(&'v Value),
    Cell(Address),
    Constant(i64),
}

/// Which outcome of a condition takes its conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JumpSense {
    WhenTrue,
    WhenFalse,
}

pub struct Compiler<'a> {
    program: &'a Program,
    symbols: SymbolTable,
    instructions: Instructions,
    /// Entry index of every procedure generated so far.
    entries: HashMap<&'a str, usize>,
    scope: &'a str,
    line: Option<usize>,
    config: CompilerConfig,
}

impl<'a> Compiler<'a> {
    pub fn new(program: &'a Program, config: Option<CompilerConfig>) -> Self {
        Self {
            program,
            symbols: SymbolTable::default(),
            instructions: Instructions::default(),
            entries: HashMap::new(),
            scope: MAIN_SCOPE,
            line: None,
            config: config.unwrap_or_default(),
        }
    }

    /// Generates the whole program: a jump over the procedure bodies, every procedure in
    /// order, then the main body and `HALT`.
    pub fn compile(mut self) -> Result<Instructions, Error> {
        let program = self.program;

        for procedure in &program.procedures {
            self.symbols.declare_procedure(procedure)?;
        }
        self.symbols.declare_main(&program.main)?;

        let to_main =
            self.emit_noted(Instruction::Jump(Target::Unresolved), || String::from("main"));

        for procedure in &program.procedures {
            self.procedure(procedure)?;
        }

        let main = self.here();
        self.patch(to_main, main)?;

        debug!("Generating main at {main}");
        self.scope = MAIN_SCOPE;
        self.commands(&program.main.commands)?;

        self.line = None;
        self.emit(Instruction::Halt);

        debug!(
            "Generated {} instructions using {} cells",
            self.instructions.len(),
            self.symbols.next_free_cell()
        );

        Ok(self.instructions)
    }

    fn commands(&mut self, commands: &'a Commands) -> Result<(), Error> {
        let enclosing = self.line;
        for command in commands {
            self.line = Some(command.line);
            self.command(&command.node)?;
        }
        self.line = enclosing;
        Ok(())
    }

    fn command(&mut self, command: &'a Command) -> Result<(), Error> {
        match command {
            Command::Assign { target, expression } => {
                self.evaluate(expression)?;
                self.store(target, false)
            }
            Command::If(command) => self.if_command(command),
            Command::While(command) => self.while_command(command),
            Command::RepeatUntil(command) => self.repeat_until_command(command),
            Command::ForTo(command) => self.for_command(command, true),
            Command::ForDownTo(command) => self.for_command(command, false),
            Command::Call(command) => self.call(command),
            Command::Read(target) => {
                self.emit(Instruction::Get(symbol_table::ACCUMULATOR));
                self.store(target, false)
            }
            Command::Write(source) => {
                self.load(source)?;
                self.emit(Instruction::Put(symbol_table::ACCUMULATOR));
                Ok(())
            }
        }
    }

    fn line(&self) -> usize {
        self.line.unwrap_or_default()
    }

    fn here(&self) -> usize {
        self.instructions.len()
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.emit(InstructionNode::new(instruction, self.line))
    }

    /// Emits an instruction carrying a listing comment when compiling in debug mode.
    fn emit_noted(&mut self, instruction: Instruction, note: impl FnOnce() -> String) -> usize {
        let mut node = InstructionNode::new(instruction, self.line);
        if self.config.debug {
            node.comment = Some(note());
        }
        self.instructions.emit(node)
    }

    fn patch(&mut self, at: usize, destination: usize) -> Result<(), Error> {
        self.instructions.patch(at, destination)?;
        Ok(())
    }

    /// Emits a jump to an instruction that already exists.
    fn jump_back(&mut self, destination: usize) {
        let offset = destination as i64 - self.here() as i64;
        self.emit(Instruction::Jump(Target::Offset(offset)));
    }

    fn placeholder(&mut self) -> usize {
        self.emit(Instruction::Jump(Target::Unresolved))
    }
}
