use super::{Compiler, Error, JumpSense, Operand};
use crate::symbol_table::{ACCUMULATOR, ADDRESS_SCRATCH, Location, VALUE_SCRATCH};
use ast::{Comparison, Condition, Identifier, Value};
use il::{Address, Instruction, Target};

#[derive(Debug, Clone, Copy)]
enum Index<'i> {
    Constant(i64),
    Variable(&'i str),
}

impl<'a> Compiler<'a> {
    /// Leaves `value` in the accumulator.
    pub(super) fn load(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Number(n) => {
                self.emit(Instruction::Set(*n));
                Ok(())
            }
            Value::Identifier(identifier) => self.load_identifier(identifier),
        }
    }

    pub(super) fn load_operand(&mut self, operand: Operand<'_>) -> Result<(), Error> {
        match operand {
            Operand::Value(value) => self.load(value)?,
            Operand::Cell(cell) => {
                self.emit(Instruction::Load(cell));
            }
            Operand::Constant(n) => {
                self.emit(Instruction::Set(n));
            }
        }
        Ok(())
    }

    /// Evaluates `operand` into a fresh temporary and returns it.
    pub(super) fn spill(&mut self, operand: Operand<'_>) -> Result<Address, Error> {
        self.load_operand(operand)?;
        let cell = self.symbols.new_temporary(self.line())?;
        self.emit(Instruction::Store(cell));
        Ok(cell)
    }

    fn load_scalar(&mut self, name: &str) -> Result<(), Error> {
        let instruction = match self.symbols.resolve_scalar(self.scope, name, self.line())? {
            Location::Direct(cell) => Instruction::Load(cell),
            Location::Reference(cell) => Instruction::LoadIndirect(cell),
        };
        self.emit_noted(instruction, || name.to_string());
        Ok(())
    }

    fn load_identifier(&mut self, identifier: &Identifier) -> Result<(), Error> {
        let (name, index) = match identifier {
            Identifier::Scalar(name) => return self.load_scalar(name),
            Identifier::Element(name, index) => (name, Index::Constant(*index)),
            Identifier::IndexedBy(name, index) => (name, Index::Variable(index)),
        };

        self.element_address(name, index)?;
        self.emit_noted(Instruction::LoadIndirect(ACCUMULATOR), || identifier.to_string());
        Ok(())
    }

    /// Leaves the address of an array element in the accumulator. Clobbers the address scratch
    /// cell.
    fn element_address(&mut self, name: &str, index: Index<'_>) -> Result<(), Error> {
        let base = self.symbols.resolve_array(self.scope, name, self.line())?;

        match index {
            Index::Constant(n) => {
                self.emit(Instruction::Set(n));
            }
            Index::Variable(index) => self.load_scalar(index)?,
        }
        self.emit(Instruction::Store(ADDRESS_SCRATCH));

        match base {
            Location::Direct(base) => self.emit(Instruction::Set(base)),
            Location::Reference(cell) => self.emit(Instruction::Load(cell)),
        };
        self.emit(Instruction::Add(ADDRESS_SCRATCH));
        Ok(())
    }

    /// Writes the accumulator to `target`. Only a loop's own step may write its iterator.
    pub(super) fn store(
        &mut self,
        target: &Identifier,
        allow_iterator_write: bool,
    ) -> Result<(), Error> {
        let (name, index) = match target {
            Identifier::Scalar(name) => return self.store_scalar(name, allow_iterator_write),
            Identifier::Element(name, index) => (name, Index::Constant(*index)),
            Identifier::IndexedBy(name, index) => (name, Index::Variable(index)),
        };

        self.emit(Instruction::Store(VALUE_SCRATCH));
        self.element_address(name, index)?;
        self.emit(Instruction::Store(ADDRESS_SCRATCH));
        self.emit(Instruction::Load(VALUE_SCRATCH));
        self.emit_noted(Instruction::StoreIndirect(ADDRESS_SCRATCH), || target.to_string());
        Ok(())
    }

    pub(super) fn store_scalar(
        &mut self,
        name: &str,
        allow_iterator_write: bool,
    ) -> Result<(), Error> {
        let instruction = match self.symbols.resolve_scalar(self.scope, name, self.line())? {
            Location::Direct(cell) => {
                if self.symbols.is_iterator(cell) && !allow_iterator_write {
                    return Err(Error::IteratorMutation(name.to_string(), self.line()));
                }
                Instruction::Store(cell)
            }
            Location::Reference(cell) => Instruction::StoreIndirect(cell),
        };
        self.emit_noted(instruction, || name.to_string());
        Ok(())
    }

    /// Computes `left - right` and emits one unresolved conditional jump. Returns the jump's
    /// index and whether it is taken when the comparison holds or when it fails.
    ///
    /// The difference wraps, so operands more than `i64::MAX` apart compare wrongly. For
    /// example `-2 < i64::MAX` is false.
    pub(super) fn emit_comparison(
        &mut self,
        left: Operand<'_>,
        operator: Comparison,
        right: Operand<'_>,
        note: impl FnOnce() -> String,
    ) -> Result<(usize, JumpSense), Error> {
        let right = self.spill(right)?;
        self.load_operand(left)?;
        self.emit(Instruction::Sub(right));

        let (jump, sense): (fn(Target) -> Instruction, JumpSense) = match operator {
            Comparison::Equal => (Instruction::JumpZero, JumpSense::WhenTrue),
            Comparison::Less => (Instruction::JumpNegative, JumpSense::WhenTrue),
            Comparison::Greater => (Instruction::JumpPositive, JumpSense::WhenTrue),
            Comparison::LessOrEqual => (Instruction::JumpPositive, JumpSense::WhenFalse),
            Comparison::GreaterOrEqual => (Instruction::JumpNegative, JumpSense::WhenFalse),
            Comparison::NotEqual => (Instruction::JumpZero, JumpSense::WhenFalse),
        };

        Ok((self.emit_noted(jump(Target::Unresolved), note), sense))
    }

    pub(super) fn emit_condition(
        &mut self,
        condition: &Condition,
    ) -> Result<(usize, JumpSense), Error> {
        self.emit_comparison(
            Operand::Value(&condition.left),
            condition.operator,
            Operand::Value(&condition.right),
            || condition.to_string(),
        )
    }
}
