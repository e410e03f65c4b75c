//! Reference interpreter for the accumulator machine.
//!
//! Memory is a sparse map of signed cells that read as zero until written. Cell 0 is the
//! accumulator itself, which is what makes `ADD 0` double it and `LOADI 0` dereference it.
//! Arithmetic wraps at 64 bits.

#[cfg(test)]
mod test;

mod device;

pub use device::{Device, StandardDevice, TestingDevice};

use il::{Address, Instruction, Target};
use log::trace;
use quick_error::quick_error;
use std::collections::HashMap;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        ListingError(err: il::Error) {
            from()
            display("Listing error: {}", err)
            source(err)
        }
        CounterOutOfRange(at: usize, destination: i64) {
            display("Instruction {} transferred control to {}, outside the program",
                at, destination)
        }
        UnresolvedJump(at: usize) {
            display("Instruction {} is a jump without a destination", at)
        }
        InputExhausted {
            display("Program requested input but none is left")
        }
        StepLimit(limit: u64) {
            display("Program did not halt within {} steps", limit)
        }
        Device(reason: String) {
            display("I/O device failure: {}", reason)
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Config {
    /// Abort with `Error::StepLimit` after this many executed instructions.
    pub step_limit: Option<u64>,
}

/// Result of a run that reached `HALT`.
#[derive(Debug)]
pub struct Outcome<T> {
    pub device: T,
    pub steps: u64,
}

pub struct Machine<T>
where
    T: Device,
{
    device: T,
    memory: HashMap<Address, i64>,
    counter: usize,
    steps: u64,
    config: Config,
}

impl<T> Machine<T>
where
    T: Device,
{
    pub fn new(device: T, config: Option<Config>) -> Self {
        Self {
            device,
            memory: HashMap::new(),
            counter: 0,
            steps: 0,
            config: config.unwrap_or_default(),
        }
    }

    fn cell(&self, address: Address) -> i64 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn set_cell(&mut self, address: Address, value: i64) {
        self.memory.insert(address, value);
    }

    fn accumulator(&self) -> i64 {
        self.cell(0)
    }

    fn set_accumulator(&mut self, value: i64) {
        self.set_cell(0, value);
    }

    fn transfer(&mut self, destination: i64, program_len: usize) -> Result<(), Error> {
        if destination < 0 || destination as usize >= program_len {
            return Err(Error::CounterOutOfRange(self.counter, destination));
        }
        self.counter = destination as usize;
        Ok(())
    }

    fn jump(&mut self, target: Target, taken: bool, program_len: usize) -> Result<(), Error> {
        let Target::Offset(offset) = target else {
            return Err(Error::UnresolvedJump(self.counter));
        };

        if !taken {
            return self.transfer(self.counter as i64 + 1, program_len);
        }

        let Some(destination) = (self.counter as i64).checked_add(offset) else {
            return Err(Error::CounterOutOfRange(self.counter, offset));
        };
        self.transfer(destination, program_len)
    }

    /// Run until `HALT`, handing the device back so its output can be inspected.
    pub fn run(mut self, program: &[Instruction]) -> Result<Outcome<T>, Error> {
        if program.is_empty() {
            return Err(Error::CounterOutOfRange(0, 0));
        }

        while self.step(program)? {
            match self.config.step_limit {
                Some(limit) if self.steps >= limit => return Err(Error::StepLimit(limit)),
                _ => {}
            }
        }

        trace!("Halted after {} steps", self.steps);

        Ok(Outcome {
            device: self.device,
            steps: self.steps,
        })
    }

    /// Execute one instruction. Returns `false` once the machine halted.
    fn step(&mut self, program: &[Instruction]) -> Result<bool, Error> {
        let len = program.len();
        let instruction = program[self.counter];
        self.steps += 1;

        match instruction {
            Instruction::Get(a) => {
                let value = self.device.get()?;
                self.set_cell(a, value);
            }
            Instruction::Put(a) => self.device.put(self.cell(a))?,
            Instruction::Load(a) => self.set_accumulator(self.cell(a)),
            Instruction::Store(a) => self.set_cell(a, self.accumulator()),
            Instruction::LoadIndirect(a) => {
                let address = self.cell(a);
                self.set_accumulator(self.cell(address));
            }
            Instruction::StoreIndirect(a) => {
                let address = self.cell(a);
                self.set_cell(address, self.accumulator());
            }
            Instruction::Add(a) => {
                self.set_accumulator(self.accumulator().wrapping_add(self.cell(a)))
            }
            Instruction::Sub(a) => {
                self.set_accumulator(self.accumulator().wrapping_sub(self.cell(a)))
            }
            Instruction::Set(n) => self.set_accumulator(n),
            // arithmetic shift floors negative values
            Instruction::Half => self.set_accumulator(self.accumulator() >> 1),
            Instruction::Jump(target) => return self.jump(target, true, len).map(|_| true),
            Instruction::JumpPositive(target) => {
                let taken = self.accumulator() > 0;
                return self.jump(target, taken, len).map(|_| true);
            }
            Instruction::JumpZero(target) => {
                let taken = self.accumulator() == 0;
                return self.jump(target, taken, len).map(|_| true);
            }
            Instruction::JumpNegative(target) => {
                let taken = self.accumulator() < 0;
                return self.jump(target, taken, len).map(|_| true);
            }
            Instruction::Return(a) => {
                let destination = self.cell(a);
                self.transfer(destination, len)?;
                return Ok(true);
            }
            Instruction::Halt => return Ok(false),
        }

        self.transfer(self.counter as i64 + 1, len)?;
        Ok(true)
    }
}

/// Parse a listing and run it to completion.
pub fn run_listing<T: Device>(
    listing: &str,
    device: T,
    config: Option<Config>,
) -> Result<Outcome<T>, Error> {
    let program = il::parse_listing(listing)?;
    Machine::new(device, config).run(&program)
}
