use serde::Deserialize;

use crate::error::{Error, Result};
use crate::opcode::Opcode;

/// What happens when the data pointer leaves the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgePolicy {
    /// Leaving the tape is a fatal fault.
    #[default]
    Error,
    /// The pointer wraps modulo the tape length.
    Wrap,
    /// Moving right past the end appends zero cells. Moving left of cell 0
    /// is still a fault.
    Grow,
}

/// How `put` renders a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// The value is a Unicode code point, written as UTF-8. Values that are
    /// not scalar values are written as their low byte.
    #[default]
    Char,
    /// The low 8 bits are written unchanged.
    Byte,
}

/// Tape and cell parameters of a machine. Immutable once a dialect is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct MachineConfig {
    /// Number of cells allocated at the start of every run.
    pub tape_size: usize,
    /// Bits per cell, 1 to 32.
    pub cell_width: u32,
    /// Cells hold two's complement values instead of unsigned ones.
    pub signed_cell: bool,
    /// Out-of-range cell values wrap instead of faulting.
    pub wrap_cell: bool,
    pub edge: EdgePolicy,
    pub output: OutputMode,
    /// Abort a run after this many executed instructions.
    pub step_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_size: 30000,
            cell_width: 8,
            signed_cell: false,
            wrap_cell: false,
            edge: EdgePolicy::Error,
            output: OutputMode::Char,
            step_limit: None,
        }
    }
}

impl MachineConfig {
    /// Check that the parameters describe a usable machine.
    pub fn validate(&self) -> Result<()> {
        if self.tape_size == 0 {
            return Err(Error::Config("tape size must be positive".to_string()));
        }
        if !(1..=32).contains(&self.cell_width) {
            return Err(Error::Config(format!(
                "cell width must be between 1 and 32 bits, got {}",
                self.cell_width
            )));
        }
        Ok(())
    }

    /// Smallest value a cell may hold.
    pub fn cell_min(&self) -> i64 {
        if self.signed_cell {
            -(1i64 << (self.cell_width - 1))
        } else {
            0
        }
    }

    /// Largest value a cell may hold.
    pub fn cell_max(&self) -> i64 {
        if self.signed_cell {
            (1i64 << (self.cell_width - 1)) - 1
        } else {
            (1i64 << self.cell_width) - 1
        }
    }
}

/// How the lexer walks the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LexMode {
    /// Earliest, then longest, match over the whole candidate set.
    #[default]
    Scan,
    /// Split on the separators and match every chunk exactly.
    Delimited,
}

/// What a lexer region does with the text between its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    /// The text becomes the literal payload of the opening token.
    Literal,
    /// The text and both markers are dropped.
    Comment,
}

/// A span of raw text opened by one opcode's token and closed by another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub open: Opcode,
    pub close: Opcode,
    pub kind: RegionKind,
}

/// Surface syntax parameters of a dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Syntax {
    /// The first entry joins tokens when rendering source.
    pub separators: Vec<String>,
    pub mode: LexMode,
    pub regions: Vec<Region>,
}

impl Syntax {
    /// Separator placed between tokens when rendering source.
    pub fn separator(&self) -> &str {
        self.separators.first().map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_byte_tape() {
        let config = MachineConfig::default();
        assert_eq!(config.cell_min(), 0);
        assert_eq!(config.cell_max(), 255);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signed_range() {
        let config = MachineConfig {
            signed_cell: true,
            ..Default::default()
        };
        assert_eq!(config.cell_min(), -128);
        assert_eq!(config.cell_max(), 127);
    }

    #[test]
    fn test_wide_cells() {
        let config = MachineConfig {
            cell_width: 32,
            ..Default::default()
        };
        assert_eq!(config.cell_max(), u32::MAX as i64);
    }

    #[test]
    fn test_validate_rejects_bad_width() {
        for width in [0, 33] {
            let config = MachineConfig {
                cell_width: width,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_validate_rejects_empty_tape() {
        let config = MachineConfig {
            tape_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_separator_defaults_to_empty() {
        assert_eq!(Syntax::default().separator(), "");
    }
}
