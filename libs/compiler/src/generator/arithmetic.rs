//! Arithmetic out of `ADD`, `SUB` and `HALF`.
//!
//! Multiplication and division run on magnitudes. Each operand is copied into a temporary,
//! negated there when negative, and the negation is counted in a sign cell; the result is
//! negated at the end when the count is odd. Parity of a cell `x` is tested with
//! `HALF; ADD 0; SUB x`, which leaves 0 for even and -1 for odd values.

use super::{Compiler, Error, Operand};
use crate::symbol_table::ACCUMULATOR;
use ast::{BinaryOperator, Expression};
use il::{Address, Instruction, Target};

impl<'a> Compiler<'a> {
    /// Leaves the value of `expression` in the accumulator.
    pub(super) fn evaluate(&mut self, expression: &Expression) -> Result<(), Error> {
        let binary = match expression {
            Expression::Value(value) => return self.load(value),
            Expression::Binary(binary) => binary,
        };

        let left = Operand::Value(&binary.left);
        let right = Operand::Value(&binary.right);

        match binary.operator {
            BinaryOperator::Add => self.add(left, right, false),
            BinaryOperator::Subtract => self.add(left, right, true),
            BinaryOperator::Multiply => self.multiply(left, right),
            BinaryOperator::Divide => self.divide(left, right),
            BinaryOperator::Modulo => self.modulo(left, right),
        }
    }

    fn add(&mut self, left: Operand<'_>, right: Operand<'_>, subtract: bool) -> Result<(), Error> {
        let right = self.spill(right)?;
        self.load_operand(left)?;

        if subtract {
            self.emit(Instruction::Sub(right));
        } else {
            self.emit(Instruction::Add(right));
        }
        Ok(())
    }

    /// Copies `operand` into a new temporary holding its absolute value, bumping `sign` when the
    /// operand was negative.
    fn magnitude(&mut self, operand: Operand<'_>, sign: Address) -> Result<Address, Error> {
        let cell = self.spill(operand)?;

        self.emit(Instruction::JumpNegative(Target::Offset(2)));
        let non_negative = self.placeholder();

        self.emit(Instruction::Set(1));
        self.emit(Instruction::Add(sign));
        self.emit(Instruction::Store(sign));
        self.negate(cell);
        self.emit(Instruction::Store(cell));

        let done = self.here();
        self.patch(non_negative, done)?;
        Ok(cell)
    }

    /// accumulator = -cell
    fn negate(&mut self, cell: Address) {
        self.emit(Instruction::Set(0));
        self.emit(Instruction::Sub(cell));
    }

    fn new_counter(&mut self, initial: i64) -> Result<Address, Error> {
        let cell = self.symbols.new_temporary(self.line())?;
        self.emit(Instruction::Set(initial));
        self.emit(Instruction::Store(cell));
        Ok(cell)
    }

    /// Emits the parity test of `cell` and returns the unresolved jump taken when it is even.
    fn jump_if_even(&mut self, cell: Address) -> usize {
        self.emit(Instruction::Load(cell));
        self.emit(Instruction::Half);
        self.emit(Instruction::Add(ACCUMULATOR));
        self.emit(Instruction::Sub(cell));
        self.emit(Instruction::JumpZero(Target::Unresolved))
    }

    /// Leaves `result` in the accumulator, negated when `sign` is odd.
    fn apply_sign(&mut self, sign: Address, result: Address) -> Result<(), Error> {
        let positive = self.jump_if_even(sign);

        self.negate(result);
        let end = self.placeholder();

        let here = self.here();
        self.patch(positive, here)?;
        self.emit(Instruction::Load(result));

        let here = self.here();
        self.patch(end, here)
    }

    /// Russian-peasant multiplication: halve the multiplier, double the multiplicand, and add the
    /// multiplicand to the product whenever the multiplier is odd.
    pub(super) fn multiply(&mut self, left: Operand<'_>, right: Operand<'_>) -> Result<(), Error> {
        let sign = self.new_counter(0)?;
        let multiplicand = self.magnitude(left, sign)?;
        let multiplier = self.magnitude(right, sign)?;
        let product = self.new_counter(0)?;

        let top = self.here();
        self.emit(Instruction::Load(multiplier));
        let finished = self.emit(Instruction::JumpZero(Target::Unresolved));

        let even = self.jump_if_even(multiplier);
        self.emit(Instruction::Load(product));
        self.emit(Instruction::Add(multiplicand));
        self.emit(Instruction::Store(product));

        let here = self.here();
        self.patch(even, here)?;
        self.emit(Instruction::Load(multiplicand));
        self.emit(Instruction::Add(ACCUMULATOR));
        self.emit(Instruction::Store(multiplicand));
        self.emit(Instruction::Load(multiplier));
        self.emit(Instruction::Half);
        self.emit(Instruction::Store(multiplier));
        self.jump_back(top);

        let here = self.here();
        self.patch(finished, here)?;
        self.apply_sign(sign, product)
    }

    /// Floor division. A zero divisor is replaced by 1 and the dividend by 0, so `x / 0` is 0.
    ///
    /// The divisor is scaled by powers of two while twice its scaled value still fits into the
    /// dividend, then walked back down one halving per round, subtracting it whenever it fits and
    /// adding the matching weight to the quotient. The number of rounds follows the quotient's
    /// bit length instead of a fixed 64, and the scaled divisor never exceeds the dividend, so
    /// doubling cannot overflow.
    pub(super) fn divide(&mut self, left: Operand<'_>, right: Operand<'_>) -> Result<(), Error> {
        let sign = self.new_counter(0)?;
        let remainder = self.magnitude(left, sign)?;
        let divisor = self.magnitude(right, sign)?;

        self.emit(Instruction::Load(divisor));
        let nonzero = self.emit(Instruction::JumpPositive(Target::Unresolved));
        self.emit(Instruction::Set(1));
        self.emit(Instruction::Store(divisor));
        self.emit(Instruction::Set(0));
        self.emit(Instruction::Store(remainder));
        let here = self.here();
        self.patch(nonzero, here)?;

        let quotient = self.new_counter(0)?;
        let weight = self.new_counter(1)?;
        let scaled = self.spill(Operand::Cell(divisor))?;

        // grow while 2 * scaled <= remainder, without ever forming 2 * scaled
        let grow = self.here();
        self.emit(Instruction::Load(remainder));
        self.emit(Instruction::Sub(scaled));
        let too_big = self.emit(Instruction::JumpNegative(Target::Unresolved));
        self.emit(Instruction::Sub(scaled));
        let almost = self.emit(Instruction::JumpNegative(Target::Unresolved));
        self.double(scaled);
        self.double(weight);
        self.jump_back(grow);

        let round = self.here();
        self.patch(too_big, round)?;
        self.patch(almost, round)?;
        self.emit(Instruction::Load(weight));
        let finished = self.emit(Instruction::JumpZero(Target::Unresolved));
        self.emit(Instruction::Load(remainder));
        self.emit(Instruction::Sub(scaled));
        let skip = self.emit(Instruction::JumpNegative(Target::Unresolved));
        self.emit(Instruction::Store(remainder));
        self.emit(Instruction::Load(quotient));
        self.emit(Instruction::Add(weight));
        self.emit(Instruction::Store(quotient));

        let here = self.here();
        self.patch(skip, here)?;
        self.halve(weight);
        self.halve(scaled);
        self.jump_back(round);

        let here = self.here();
        self.patch(finished, here)?;

        // a negative quotient with a remainder rounds away from zero
        let positive = self.jump_if_even(sign);
        self.emit(Instruction::Load(remainder));
        let exact = self.emit(Instruction::JumpZero(Target::Unresolved));
        self.emit(Instruction::Set(1));
        self.emit(Instruction::Add(quotient));
        self.emit(Instruction::Store(quotient));

        let here = self.here();
        self.patch(exact, here)?;
        self.negate(quotient);
        let end = self.placeholder();

        let here = self.here();
        self.patch(positive, here)?;
        self.emit(Instruction::Load(quotient));

        let here = self.here();
        self.patch(end, here)
    }

    /// `x % y = x - y * (x / y)`, and 0 when `y` is 0. Takes the sign of the divisor.
    pub(super) fn modulo(&mut self, left: Operand<'_>, right: Operand<'_>) -> Result<(), Error> {
        let dividend = self.spill(left)?;
        let divisor = self.spill(right)?;

        let by_zero = self.emit(Instruction::JumpZero(Target::Unresolved));

        self.divide(Operand::Cell(dividend), Operand::Cell(divisor))?;
        let quotient = self.symbols.new_temporary(self.line())?;
        self.emit(Instruction::Store(quotient));

        self.multiply(Operand::Cell(divisor), Operand::Cell(quotient))?;
        let product = self.symbols.new_temporary(self.line())?;
        self.emit(Instruction::Store(product));

        self.emit(Instruction::Load(dividend));
        self.emit(Instruction::Sub(product));
        let end = self.placeholder();

        let here = self.here();
        self.patch(by_zero, here)?;
        self.emit(Instruction::Set(0));

        let here = self.here();
        self.patch(end, here)
    }

    fn double(&mut self, cell: Address) {
        self.emit(Instruction::Load(cell));
        self.emit(Instruction::Add(ACCUMULATOR));
        self.emit(Instruction::Store(cell));
    }

    fn halve(&mut self, cell: Address) {
        self.emit(Instruction::Load(cell));
        self.emit(Instruction::Half);
        self.emit(Instruction::Store(cell));
    }
}
