use super::{Compiler, Error, JumpSense, Operand};
use ast::{Comparison, Commands, ForCommand, IfCommand, RepeatUntilCommand, WhileCommand};
use il::{Address, Instruction};

impl<'a> Compiler<'a> {
    /// The side the conditional jump does not take is emitted first, followed by a jump over the
    /// side it does take.
    pub(super) fn if_command(&mut self, command: &'a IfCommand) -> Result<(), Error> {
        let (jump, sense) = self.emit_condition(&command.condition)?;

        let (fallthrough, target) = match sense {
            JumpSense::WhenTrue => (command.else_branch.as_ref(), Some(&command.then_branch)),
            JumpSense::WhenFalse => (Some(&command.then_branch), command.else_branch.as_ref()),
        };

        if let Some(commands) = fallthrough {
            self.commands(commands)?;
        }

        let Some(target) = target else {
            let here = self.here();
            return self.patch(jump, here);
        };

        let over = self.placeholder();
        let here = self.here();
        self.patch(jump, here)?;

        self.commands(target)?;

        let here = self.here();
        self.patch(over, here)
    }

    /// Shared tail of `WHILE` and `FOR`: `start` is the first instruction of the condition, which
    /// has just emitted `jump`.
    fn loop_body(
        &mut self,
        start: usize,
        (jump, sense): (usize, JumpSense),
        body: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        match sense {
            JumpSense::WhenTrue => {
                let exit = self.placeholder();
                let here = self.here();
                self.patch(jump, here)?;

                body(self)?;
                self.jump_back(start);

                let here = self.here();
                self.patch(exit, here)
            }
            JumpSense::WhenFalse => {
                body(self)?;
                self.jump_back(start);

                let here = self.here();
                self.patch(jump, here)
            }
        }
    }

    pub(super) fn while_command(&mut self, command: &'a WhileCommand) -> Result<(), Error> {
        let start = self.here();
        let condition = self.emit_condition(&command.condition)?;

        self.loop_body(start, condition, |this| this.commands(&command.body))
    }

    pub(super) fn repeat_until_command(
        &mut self,
        command: &'a RepeatUntilCommand,
    ) -> Result<(), Error> {
        let start = self.here();
        self.commands(&command.body)?;

        let (jump, sense) = self.emit_condition(&command.condition)?;

        match sense {
            JumpSense::WhenFalse => self.patch(jump, start),
            JumpSense::WhenTrue => {
                self.jump_back(start);
                let here = self.here();
                self.patch(jump, here)
            }
        }
    }

    /// `FOR i FROM a TO b` runs as `WHILE i <= b` over a protected iterator cell, with `b`
    /// evaluated once before the loop. Both bounds are read before `i` is bound, so they see any
    /// outer variable of the same name.
    pub(super) fn for_command(
        &mut self,
        command: &'a ForCommand,
        ascending: bool,
    ) -> Result<(), Error> {
        let bound = self.spill(Operand::Value(&command.to))?;
        self.load(&command.from)?;

        let iterator = self
            .symbols
            .bind_iterator(self.scope, &command.iterator, self.line())?;
        let name = command.iterator.as_str();
        self.emit_noted(Instruction::Store(iterator), || name.to_string());

        let (guard, step) = if ascending {
            (Comparison::LessOrEqual, 1)
        } else {
            (Comparison::GreaterOrEqual, -1)
        };

        let start = self.here();
        let condition = self.emit_comparison(
            Operand::Cell(iterator),
            guard,
            Operand::Cell(bound),
            || format!("{name} {guard} {}", command.to),
        )?;

        self.loop_body(start, condition, |this| {
            this.loop_commands(&command.body, step, iterator, name)
        })?;

        self.symbols.unbind_iterator();
        Ok(())
    }

    fn loop_commands(
        &mut self,
        body: &'a Commands,
        step: i64,
        iterator: Address,
        name: &str,
    ) -> Result<(), Error> {
        self.commands(body)?;

        self.emit(Instruction::Set(step));
        self.emit(Instruction::Add(iterator));
        self.store_scalar(name, true)
    }
}
