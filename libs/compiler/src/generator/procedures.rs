//! Calling convention.
//!
//! Every parameter cell receives an address: the argument's own cell (or array base) when the
//! caller owns it, or the address the caller's parameter already holds when the argument is
//! itself a parameter. Calls store their return index in the callee's single return cell, so a
//! procedure must not be active twice at once. Only procedures generated before the call site
//! can be called, which rules out recursion.

use super::{Compiler, Error};
use crate::symbol_table::Location;
use ast::{CallCommand, ParameterKind, Procedure};
use il::{Instruction, Target};
use log::debug;

impl<'a> Compiler<'a> {
    pub(super) fn procedure(&mut self, procedure: &'a Procedure) -> Result<(), Error> {
        let name = procedure.name.node.as_str();
        let entry = self.here();
        debug!("Generating procedure `{name}` at {entry}");

        self.scope = name;
        self.line = Some(procedure.name.line);
        self.commands(&procedure.commands)?;

        let Some(signature) = self.symbols.signature(name) else {
            return Err(Error::UndeclaredProcedure(name.to_string(), procedure.name.line));
        };
        let return_cell = signature.return_cell;
        self.emit_noted(Instruction::Return(return_cell), || format!("return from {name}"));

        self.entries.insert(name, entry);
        Ok(())
    }

    pub(super) fn call(&mut self, command: &'a CallCommand) -> Result<(), Error> {
        let line = self.line();
        let name = command.name.as_str();

        let (Some(&entry), Some(signature)) = (self.entries.get(name), self.symbols.signature(name))
        else {
            return Err(Error::UndeclaredProcedure(name.to_string(), line));
        };

        if signature.parameters.len() != command.arguments.len() {
            return Err(Error::ArgumentMismatch {
                procedure: name.to_string(),
                reason: format!(
                    "expected {} argument(s), found {}",
                    signature.parameters.len(),
                    command.arguments.len()
                ),
                line,
            });
        }

        let mut bindings = Vec::with_capacity(command.arguments.len());
        for (argument, &(parameter, kind)) in command.arguments.iter().zip(&signature.parameters) {
            let found = self.symbols.kind_of(self.scope, argument, line)?;
            if found != kind {
                return Err(Error::ArgumentMismatch {
                    procedure: name.to_string(),
                    reason: format!("`{argument}` is {found}, expected {kind}"),
                    line,
                });
            }

            let location = match kind {
                ParameterKind::Scalar => self.symbols.resolve_scalar(self.scope, argument, line)?,
                ParameterKind::Array => self.symbols.resolve_array(self.scope, argument, line)?,
            };
            bindings.push((argument, location, parameter));
        }
        let return_cell = signature.return_cell;

        for (argument, location, parameter) in bindings {
            match location {
                Location::Reference(cell) => self.emit(Instruction::Load(cell)),
                Location::Direct(address) => self.emit(Instruction::Set(address)),
            };
            self.emit_noted(Instruction::Store(parameter), || format!("{name}({argument})"));
        }

        let resume = self.here() as i64 + 3;
        self.emit(Instruction::Set(resume));
        self.emit(Instruction::Store(return_cell));

        let offset = entry as i64 - self.here() as i64;
        self.emit_noted(Instruction::Jump(Target::Offset(offset)), || format!("call {name}"));
        Ok(())
    }
}
