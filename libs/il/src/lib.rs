#[cfg(test)]
mod test;

use quick_error::quick_error;
use std::collections::HashMap;
use std::fmt;
use std::io::{BufWriter, Write};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// A memory cell number of the target machine.
pub type Address = i64;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Parse(line: usize, reason: String) {
            display("Invalid instruction at line {}: {}", line, reason)
        }
        UnresolvedJump(index: usize) {
            display("Jump at instruction {} was never resolved", index)
        }
        NotAJump(index: usize) {
            display("Instruction {} is not a jump and cannot be patched", index)
        }
        IoError(err: std::io::Error) {
            from()
            display("Write error: {}", err)
            source(err)
        }
    }
}

/// The operand of a relative jump. Jumps are emitted `Unresolved` and patched once the index of
/// their destination is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Offset(i64),
    Unresolved,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Offset(offset) => write!(f, "{}", offset),
            Target::Unresolved => write!(f, "?"),
        }
    }
}

/// A single instruction of the accumulator machine. Cell 0 doubles as the accumulator, so
/// `ADD 0` doubles it and `LOADI 0` dereferences it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `GET a` - read one integer from input into cell `a`
    Get(Address),
    /// `PUT a` - write cell `a` to output
    Put(Address),
    /// `LOAD a` - acc = cell[a]
    Load(Address),
    /// `STORE a` - cell[a] = acc
    Store(Address),
    /// `LOADI a` - acc = cell[cell[a]]
    LoadIndirect(Address),
    /// `STOREI a` - cell[cell[a]] = acc
    StoreIndirect(Address),
    /// `ADD a` - acc = acc + cell[a]
    Add(Address),
    /// `SUB a` - acc = acc - cell[a]
    Sub(Address),
    /// `SET n` - acc = n
    Set(i64),
    /// `HALF` - acc = floor(acc / 2)
    Half,
    /// `JUMP k` - unconditional relative jump
    Jump(Target),
    /// `JPOS k` - jump if acc > 0
    JumpPositive(Target),
    /// `JZERO k` - jump if acc == 0
    JumpZero(Target),
    /// `JNEG k` - jump if acc < 0
    JumpNegative(Target),
    /// `RTRN a` - jump to the absolute instruction index stored in cell `a`
    Return(Address),
    /// `HALT`
    Halt,
}

impl Instruction {
    pub fn target(&self) -> Option<Target> {
        match self {
            Instruction::Jump(t)
            | Instruction::JumpPositive(t)
            | Instruction::JumpZero(t)
            | Instruction::JumpNegative(t) => Some(*t),
            _ => None,
        }
    }

    fn target_mut(&mut self) -> Option<&mut Target> {
        match self {
            Instruction::Jump(t)
            | Instruction::JumpPositive(t)
            | Instruction::JumpZero(t)
            | Instruction::JumpNegative(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Get(a) => write!(f, "GET {}", a),
            Instruction::Put(a) => write!(f, "PUT {}", a),
            Instruction::Load(a) => write!(f, "LOAD {}", a),
            Instruction::Store(a) => write!(f, "STORE {}", a),
            Instruction::LoadIndirect(a) => write!(f, "LOADI {}", a),
            Instruction::StoreIndirect(a) => write!(f, "STOREI {}", a),
            Instruction::Add(a) => write!(f, "ADD {}", a),
            Instruction::Sub(a) => write!(f, "SUB {}", a),
            Instruction::Set(n) => write!(f, "SET {}", n),
            Instruction::Half => write!(f, "HALF"),
            Instruction::Jump(t) => write!(f, "JUMP {}", t),
            Instruction::JumpPositive(t) => write!(f, "JPOS {}", t),
            Instruction::JumpZero(t) => write!(f, "JZERO {}", t),
            Instruction::JumpNegative(t) => write!(f, "JNEG {}", t),
            Instruction::Return(a) => write!(f, "RTRN {}", a),
            Instruction::Halt => write!(f, "HALT"),
        }
    }
}

impl FromStr for Instruction {
    type Err = String;

    /// Parses one listing line with any `#` comment already stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let mnemonic = parts.next().ok_or("empty instruction")?;
        let operand = parts.next();

        if let Some(extra) = parts.next() {
            return Err(format!("unexpected `{extra}` after operand"));
        }

        let number = || -> Result<i64, String> {
            let text = operand.ok_or(format!("`{mnemonic}` expects an operand"))?;
            text.parse::<i64>()
                .map_err(|e| format!("invalid operand `{text}`: {e}"))
        };
        let offset = || number().map(Target::Offset);

        let instruction = match mnemonic {
            "GET" => Instruction::Get(number()?),
            "PUT" => Instruction::Put(number()?),
            "LOAD" => Instruction::Load(number()?),
            "STORE" => Instruction::Store(number()?),
            "LOADI" => Instruction::LoadIndirect(number()?),
            "STOREI" => Instruction::StoreIndirect(number()?),
            "ADD" => Instruction::Add(number()?),
            "SUB" => Instruction::Sub(number()?),
            "SET" => Instruction::Set(number()?),
            "JUMP" => Instruction::Jump(offset()?),
            "JPOS" => Instruction::JumpPositive(offset()?),
            "JZERO" => Instruction::JumpZero(offset()?),
            "JNEG" => Instruction::JumpNegative(offset()?),
            "RTRN" => Instruction::Return(number()?),
            "HALF" | "HALT" => {
                if let Some(operand) = operand {
                    return Err(format!("`{mnemonic}` takes no operand, found `{operand}`"));
                }
                if mnemonic == "HALF" {
                    Instruction::Half
                } else {
                    Instruction::Halt
                }
            }
            other => return Err(format!("unknown mnemonic `{other}`")),
        };

        Ok(instruction)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InstructionNode {
    pub instruction: Instruction,
    /// Source line of the command this instruction was generated for.
    pub line: Option<usize>,
    /// Listing annotation, only populated when compiling in debug mode.
    pub comment: Option<String>,
}

impl fmt::Display for InstructionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comment {
            Some(comment) => write!(f, "{} #{}", self.instruction, comment),
            None => write!(f, "{}", self.instruction),
        }
    }
}

impl InstructionNode {
    pub fn new(instruction: Instruction, line: Option<usize>) -> Self {
        Self {
            instruction,
            line,
            comment: None,
        }
    }
}

#[derive(Default, Debug)]
pub struct Instructions(Vec<InstructionNode>);

impl Deref for Instructions {
    type Target = Vec<InstructionNode>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Instructions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Instructions {
    /// Appends an instruction and returns its index.
    pub fn emit(&mut self, node: InstructionNode) -> usize {
        self.0.push(node);
        self.0.len() - 1
    }

    /// Resolves the jump at `at` so that it lands on instruction `destination`.
    pub fn patch(&mut self, at: usize, destination: usize) -> Result<(), Error> {
        let target = self
            .0
            .get_mut(at)
            .and_then(|node| node.instruction.target_mut())
            .ok_or(Error::NotAJump(at))?;

        *target = Target::Offset(destination as i64 - at as i64);
        Ok(())
    }

    /// Index of the first jump that still has no destination.
    pub fn first_unresolved(&self) -> Option<usize> {
        self.0
            .iter()
            .position(|node| node.instruction.target() == Some(Target::Unresolved))
    }

    pub fn write<W: Write>(&self, writer: &mut BufWriter<W>) -> Result<(), Error> {
        if let Some(index) = self.first_unresolved() {
            return Err(Error::UnresolvedJump(index));
        }

        for node in &self.0 {
            writer.write_all(node.to_string().as_bytes())?;
            writer.write_all(b"\n")?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Maps instruction index to the source line it was generated for.
    pub fn source_map(&self) -> HashMap<usize, usize> {
        let mut map = HashMap::new();

        for (index, node) in self.0.iter().enumerate() {
            if let Some(line) = node.line {
                map.insert(index, line);
            }
        }

        map
    }

    /// The bare instruction sequence, as an interpreter consumes it.
    pub fn program(&self) -> Vec<Instruction> {
        self.0.iter().map(|node| node.instruction).collect()
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.0 {
            writeln!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Parses a listing: one instruction per line, `#` starts a comment, blank lines are skipped.
pub fn parse_listing(listing: &str) -> Result<Vec<Instruction>, Error> {
    let mut program = Vec::new();

    for (index, raw) in listing.lines().enumerate() {
        let code = raw.split('#').next().unwrap_or_default().trim();
        if code.is_empty() {
            continue;
        }

        let instruction = code
            .parse::<Instruction>()
            .map_err(|reason| Error::Parse(index + 1, reason))?;
        program.push(instruction);
    }

    Ok(program)
}
