use std::fmt;
use std::str::FromStr;

use crate::error::ParseInstructionError;

/// Score carried by a game. Arithmetic saturates at the bounds.
pub type Score = i128;

/// The operand-less tag of an instruction, as printed in trace lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Add,
    Sub,
    Mul,
    Jmp,
    Hlt,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::Nop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Jmp,
        Opcode::Hlt,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Jmp => "jmp",
            Opcode::Hlt => "hlt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = ParseInstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| ParseInstructionError::UnknownOpcode(s.to_string()))
    }
}

/// One board cell.
///
/// Arithmetic instructions carry their operand; `Jmp` carries an absolute
/// index into the map. Jump targets are not wrapped: a map is responsible for
/// keeping them in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Nop,
    Add(u32),
    Sub(u32),
    Mul(u32),
    Jmp(usize),
    Hlt,
}

impl Instruction {
    pub fn opcode(self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Add(_) => Opcode::Add,
            Instruction::Sub(_) => Opcode::Sub,
            Instruction::Mul(_) => Opcode::Mul,
            Instruction::Jmp(_) => Opcode::Jmp,
            Instruction::Hlt => Opcode::Hlt,
        }
    }

    /// The score after landing on this instruction.
    ///
    /// Only `add`, `sub` and `mul` touch the score; everything else returns it
    /// unchanged. Results clamp to `Score::MIN..=Score::MAX`.
    pub fn apply(self, score: Score) -> Score {
        match self {
            Instruction::Add(n) => score.saturating_add(Score::from(n)),
            Instruction::Sub(n) => score.saturating_sub(Score::from(n)),
            Instruction::Mul(n) => score.saturating_mul(Score::from(n)),
            Instruction::Nop | Instruction::Jmp(_) | Instruction::Hlt => score,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Instruction::Jmp(_))
    }

    pub fn is_halt(self) -> bool {
        matches!(self, Instruction::Hlt)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Add(n) | Instruction::Sub(n) | Instruction::Mul(n) => {
                write!(f, "{} {n}", self.opcode())
            }
            Instruction::Jmp(target) => write!(f, "{} {target}", self.opcode()),
            Instruction::Nop | Instruction::Hlt => write!(f, "{}", self.opcode()),
        }
    }
}

impl FromStr for Instruction {
    type Err = ParseInstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let opcode: Opcode = tokens.next().ok_or(ParseInstructionError::Empty)?.parse()?;

        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::Hlt => Instruction::Hlt,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Jmp => {
                let operand = tokens
                    .next()
                    .ok_or_else(|| ParseInstructionError::MissingOperand(opcode.to_string()))?;
                let invalid = || ParseInstructionError::InvalidOperand {
                    opcode: opcode.to_string(),
                    operand: operand.to_string(),
                };
                match opcode {
                    Opcode::Jmp => Instruction::Jmp(operand.parse().map_err(|_| invalid())?),
                    _ => {
                        let n: u32 = operand.parse().map_err(|_| invalid())?;
                        match opcode {
                            Opcode::Add => Instruction::Add(n),
                            Opcode::Sub => Instruction::Sub(n),
                            _ => Instruction::Mul(n),
                        }
                    }
                }
            }
        };

        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            return Err(ParseInstructionError::Trailing(rest.join(" ")));
        }
        Ok(instruction)
    }
}
