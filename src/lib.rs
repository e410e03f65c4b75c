//! Front door to the toolchain: turn a serialized syntax tree into a machine listing, and run
//! listings on the reference interpreter.

use std::io::{BufWriter, Write};

use log::debug;
use thiserror::Error;

pub use ast;
pub use compiler;
pub use il;
pub use vm;

use ast::Program;
use compiler::{Compiler, CompilerConfig};
use il::Instructions;
use vm::{Device, Outcome};

#[cfg(test)]
mod test;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed syntax tree: {0}")]
    Tree(#[from] serde_json::Error),

    #[error(transparent)]
    Compile(#[from] compiler::Error),

    #[error(transparent)]
    Listing(#[from] il::Error),

    #[error(transparent)]
    Runtime(#[from] vm::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Deserialize a syntax tree from its JSON form.
pub fn parse_tree(json: &str) -> Result<Program, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Compile a JSON syntax tree. Nothing is produced when generation fails.
pub fn compile_tree(json: &str, config: Option<CompilerConfig>) -> Result<Instructions, Error> {
    let program = parse_tree(json)?;
    let instructions = Compiler::new(&program, config).compile()?;

    debug!(
        "{} procedure(s) compiled into {} instructions",
        program.procedures.len(),
        instructions.len()
    );

    Ok(instructions)
}

/// Compile a JSON syntax tree and write its listing to `writer`.
pub fn compile_to_writer<W: Write>(
    json: &str,
    config: Option<CompilerConfig>,
    writer: &mut BufWriter<W>,
) -> Result<(), Error> {
    compile_tree(json, config)?.write(writer)?;
    Ok(())
}

pub fn compile_to_string(json: &str, config: Option<CompilerConfig>) -> Result<String, Error> {
    let mut writer = BufWriter::new(Vec::new());
    compile_to_writer(json, config, &mut writer)?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run a listing to `HALT` on `device`.
pub fn run<T: Device>(
    listing: &str,
    device: T,
    config: Option<vm::Config>,
) -> Result<Outcome<T>, Error> {
    Ok(vm::run_listing(listing, device, config)?)
}
