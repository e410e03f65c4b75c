//! Code generator for the accumulator machine.
//!
//! `Compiler` walks an `ast::Program` and produces `il::Instructions`. Every variable, array,
//! parameter and temporary gets its own cell from the `symbol_table` for the whole run.

mod generator;
pub mod symbol_table;
#[cfg(test)]
mod test;

pub use generator::{Compiler, CompilerConfig, Error};
