use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A machine operation.
///
/// The first eight variants are the core Brainfuck instruction set. The rest
/// are extensions that dialects opt into by listing them in their token table;
/// each one has a standard handler in [`crate::ops`]. `Custom` covers opcodes
/// that only exist in user code and must come with their own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Move the data pointer right.
    Nxt,
    /// Move the data pointer left.
    Prv,
    /// Increment the current cell.
    Inc,
    /// Decrement the current cell.
    Dec,
    /// Write the current cell to the output.
    Put,
    /// Read one character into the current cell.
    Get,
    /// Jump past the matching `cls` if the current cell is zero.
    Opn,
    /// Jump back to the matching `opn` if the current cell is nonzero.
    Cls,

    Nop,
    Or,
    And,
    Not,
    Xor,
    Shl,
    Shr,
    Njm,
    Pjm,
    Zro,
    Hom,
    /// Write a literal captured by the lexer into consecutive cells.
    Buf,
    EndBuf,
    Com,
    EndCom,

    Custom(&'static str),
}

/// The core instruction set in canonical order.
pub const CORE: [Opcode; 8] = [
    Opcode::Nxt,
    Opcode::Prv,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Put,
    Opcode::Get,
    Opcode::Opn,
    Opcode::Cls,
];

const EXTENDED: [Opcode; 15] = [
    Opcode::Nop,
    Opcode::Or,
    Opcode::And,
    Opcode::Not,
    Opcode::Xor,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::Njm,
    Opcode::Pjm,
    Opcode::Zro,
    Opcode::Hom,
    Opcode::Buf,
    Opcode::EndBuf,
    Opcode::Com,
    Opcode::EndCom,
];

impl Opcode {
    /// Short name used in dialect definitions and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Nxt => "nxt",
            Opcode::Prv => "prv",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Put => "put",
            Opcode::Get => "get",
            Opcode::Opn => "opn",
            Opcode::Cls => "cls",
            Opcode::Nop => "nop",
            Opcode::Or => "or",
            Opcode::And => "and",
            Opcode::Not => "not",
            Opcode::Xor => "xor",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Njm => "njm",
            Opcode::Pjm => "pjm",
            Opcode::Zro => "zro",
            Opcode::Hom => "hom",
            Opcode::Buf => "buf",
            Opcode::EndBuf => "end_buf",
            Opcode::Com => "com",
            Opcode::EndCom => "end_com",
            Opcode::Custom(name) => name,
        }
    }

    /// True for the eight opcodes the engine implements itself.
    pub fn is_core(self) -> bool {
        CORE.contains(&self)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = Error;

    /// Parses the name of a core or extension opcode. Custom opcodes have no
    /// textual form and are never produced here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CORE.iter()
            .chain(EXTENDED.iter())
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::UnknownOpcodeName(s.to_string()))
    }
}
