use rand::distributions::WeightedError;
use thiserror::Error;

/// Failure to read an instruction from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseInstructionError {
    #[error("empty instruction")]
    Empty,
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("`{0}` requires an operand")]
    MissingOperand(String),
    #[error("invalid operand `{operand}` for `{opcode}`")]
    InvalidOperand { opcode: String, operand: String },
    #[error("unexpected trailing input `{0}`")]
    Trailing(String),
}

/// A map that violates the board invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("a map needs at least 2 cells, got {0}")]
    TooShort(usize),
    #[error("the first cell must be `nop`, found `{0}`")]
    BadStart(String),
    #[error("the last cell must be `hlt`, found `{0}`")]
    BadEnd(String),
    #[error("jump at {position} targets {target}, past the end of a {len}-cell map")]
    JumpOutOfRange {
        position: usize,
        target: usize,
        len: usize,
    },
    #[error("invalid opcode weights: {0}")]
    Weights(#[from] WeightedError),
    #[error("cell {position}: {source}")]
    Parse {
        position: usize,
        #[source]
        source: ParseInstructionError,
    },
}

/// A game that could not be played to a halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("jump chain exceeded {hops} hops at position {position}")]
    JumpCycle { position: usize, hops: usize },
}
