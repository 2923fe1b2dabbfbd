//! Dialect definition files (TOML).
//!
//! ```toml
//! name = "arrows"
//! separators = [" "]
//!
//! [machine]
//! wrap-cell = true
//!
//! [[op]]
//! name = "nxt"
//! tokens = ["→", ">"]
//! ```
//!
//! Opcodes are referred to by name. Extension opcodes get their standard
//! handlers; custom opcodes need code and cannot be declared here.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::{LexMode, MachineConfig, RegionKind};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::opcode::Opcode;
use crate::table::TokenTable;

/// A parsed definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    pub name: String,

    /// Token separators; the first one joins rendered source.
    #[serde(default)]
    pub separators: Vec<String>,

    #[serde(default)]
    pub mode: LexMode,

    /// The `[machine]` table. Missing keys keep their defaults.
    #[serde(default)]
    pub machine: MachineConfig,

    /// `[[op]]` entries in table order.
    #[serde(rename = "op")]
    pub ops: Vec<OpEntry>,

    /// `[[region]]` entries.
    #[serde(default, rename = "region")]
    pub regions: Vec<RegionEntry>,
}

/// One `[[op]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpEntry {
    pub name: String,
    /// Canonical token first.
    pub tokens: Vec<String>,
}

/// One `[[region]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionEntry {
    pub open: String,
    pub close: String,
    pub kind: RegionKind,
}

impl Definition {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content, path)
    }

    /// Parse a definition. `path` is only used in error messages.
    pub fn from_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Definition {
            path: path.to_owned(),
            message: e.to_string(),
        })
    }

    /// Build the dialect described by this definition.
    pub fn build(&self) -> Result<Dialect> {
        let mut entries = Vec::with_capacity(self.ops.len());
        for entry in &self.ops {
            let op: Opcode = entry.name.parse()?;
            entries.push((op, entry.tokens.clone()));
        }

        let mut builder = Dialect::builder(&self.name, TokenTable::new(entries)?)
            .config(self.machine.clone())
            .separators(self.separators.iter().cloned())
            .mode(self.mode);
        for region in &self.regions {
            builder = builder.region(region.open.parse()?, region.close.parse()?, region.kind);
        }
        builder.build()
    }
}

/// Read, parse and build a definition file. Build failures are reported
/// against the file.
pub fn load(path: &Path) -> Result<Dialect> {
    let definition = Definition::from_file(path)?;
    let dialect = definition.build().map_err(|e| Error::Definition {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), name = dialect.name(), "loaded dialect definition");
    Ok(dialect)
}
