//! Error types.
//!
//! [`Fault`] is what a single instruction, hook or tape access can raise.
//! The engine wraps it into [`Error::Runtime`] together with the machine
//! registers at the point of failure.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::opcode::Opcode;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which way a bracket search was going when it ran off the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// A fatal condition raised while executing one step.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("unmatched bracket: {direction} search ran off the program")]
    UnmatchedBracket { direction: Direction },

    #[error("data pointer moved to {target}, outside a tape of {len} cells")]
    PointerOutOfRange { target: i64, len: usize },

    #[error("cell value {value} outside {min}..={max}")]
    CellOverflow { value: i64, min: i64, max: i64 },

    #[error("cell {index} holds {value}, which names no opcode")]
    UnknownCell { index: usize, value: i64 },

    #[error("opcode {0} has no position in the token table")]
    Unmapped(Opcode),

    #[error("no handler registered for opcode {0}")]
    NoHandler(Opcode),

    #[error("input stream closed")]
    InputClosed,

    #[error("step limit of {0} reached")]
    StepLimit(usize),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every fatal error the crate reports.
#[derive(Debug, Error)]
pub enum Error {
    #[error("comment opened at byte {offset} is never closed")]
    UnterminatedComment { offset: usize },

    #[error("unknown token {0:?}")]
    UnknownToken(String),

    #[error("opcode {0} is not in the token table")]
    UnknownOpcode(Opcode),

    #[error("unknown opcode name {0:?}")]
    UnknownOpcodeName(String),

    #[error("opcode {opcode} has {count} tokens, no alias at index {index}")]
    AliasOutOfRange {
        opcode: Opcode,
        index: usize,
        count: usize,
    },

    #[error("token list has {found} entries but the table has {expected} opcodes")]
    TokenCountMismatch { expected: usize, found: usize },

    #[error("opcode {0} has an empty token")]
    EmptyToken(Opcode),

    #[error("opcode {0} has no tokens")]
    NoTokens(Opcode),

    #[error("opcode {0} is declared twice")]
    DuplicateOpcode(Opcode),

    #[error("opcode {0} needs a handler")]
    MissingHandler(Opcode),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{fault} ({location})")]
    Runtime {
        #[source]
        fault: Fault,
        location: Location,
    },

    #[error("invalid dialect definition {path}: {message}")]
    Definition { path: PathBuf, message: String },

    #[error("unknown dialect {0:?}")]
    UnknownDialect(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Machine registers captured when a run aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Opcode being executed, `None` for failures inside run hooks.
    pub op: Option<Opcode>,
    pub ip: usize,
    pub dp: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Some(op) => write!(f, "at {op}, ip {}, dp {}", self.ip, self.dp),
            None => write!(f, "outside the program, ip {}, dp {}", self.ip, self.dp),
        }
    }
}
