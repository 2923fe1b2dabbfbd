use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::opcode::Opcode;

/// Bidirectional mapping between opcodes and their surface tokens.
///
/// Opcodes keep the order they were declared in; that order is what
/// [`TokenTable::replace_tokens`] assigns against and what self-modifying
/// dialects use to turn cell values into opcodes. Each opcode has one or
/// more aliases and the first one is canonical.
///
/// Tokens are expected to be unique across opcodes. The table does not
/// enforce this: when two opcodes share a token, [`TokenTable::opcode_of`]
/// answers with whichever opcode was declared first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTable {
    entries: Vec<(Opcode, Vec<String>)>,
    index: HashMap<String, Opcode>,
}

impl TokenTable {
    /// Build a table from `(opcode, aliases)` pairs in declaration order.
    /// Each opcode may appear only once.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Opcode, Vec<S>)>,
        S: Into<String>,
    {
        let entries: Vec<(Opcode, Vec<String>)> = entries
            .into_iter()
            .map(|(op, tokens)| (op, tokens.into_iter().map(Into::into).collect()))
            .collect();
        let mut seen = HashSet::new();
        for (op, tokens) in &entries {
            if !seen.insert(*op) {
                return Err(Error::DuplicateOpcode(*op));
            }
            check_aliases(*op, tokens)?;
        }
        let index = build_index(&entries);
        Ok(Self { entries, index })
    }

    /// Build a table over the eight core opcodes with one token each.
    pub fn core(tokens: [&str; 8]) -> Result<Self> {
        Self::new(
            crate::opcode::CORE
                .iter()
                .zip(tokens)
                .map(|(&op, token)| (op, vec![token])),
        )
    }

    /// Number of opcodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Opcodes in declaration order.
    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.entries.iter().map(|(op, _)| *op)
    }

    /// Canonical token of every opcode, in declaration order.
    pub fn tokens(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|(_, tokens)| tokens[0].as_str())
            .collect()
    }

    /// Every token including aliases, in declaration order.
    pub fn all_tokens(&self) -> Vec<&str> {
        self.entries
            .iter()
            .flat_map(|(_, tokens)| tokens.iter().map(String::as_str))
            .collect()
    }

    /// All aliases of `op`, or `None` when the table lacks it.
    pub fn aliases(&self, op: Opcode) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(o, _)| *o == op)
            .map(|(_, tokens)| tokens.as_slice())
    }

    /// Position of `op` in declaration order.
    pub fn position(&self, op: Opcode) -> Option<usize> {
        self.entries.iter().position(|(o, _)| *o == op)
    }

    pub fn contains(&self, op: Opcode) -> bool {
        self.position(op).is_some()
    }

    /// Opcode owning `token`.
    pub fn opcode_of(&self, token: &str) -> Result<Opcode> {
        self.index
            .get(token)
            .copied()
            .ok_or_else(|| Error::UnknownToken(token.to_string()))
    }

    /// Alias number `alias` of `op`; alias 0 is the canonical token.
    pub fn token_of(&self, op: Opcode, alias: usize) -> Result<&str> {
        let tokens = self.aliases(op).ok_or(Error::UnknownOpcode(op))?;
        tokens
            .get(alias)
            .map(String::as_str)
            .ok_or(Error::AliasOutOfRange {
                opcode: op,
                index: alias,
                count: tokens.len(),
            })
    }

    /// Give every opcode, in order, a single new token.
    pub fn replace_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
        self.replace_aliases(
            tokens
                .iter()
                .map(|t| vec![t.as_ref().to_string()])
                .collect(),
        )
    }

    /// Give every opcode, in order, a new alias list. On error the table is
    /// left untouched.
    pub fn replace_aliases(&mut self, aliases: Vec<Vec<String>>) -> Result<()> {
        if aliases.len() != self.entries.len() {
            return Err(Error::TokenCountMismatch {
                expected: self.entries.len(),
                found: aliases.len(),
            });
        }
        for ((op, _), tokens) in self.entries.iter().zip(&aliases) {
            check_aliases(*op, tokens)?;
        }
        for ((_, slot), tokens) in self.entries.iter_mut().zip(aliases) {
            *slot = tokens;
        }
        self.index = build_index(&self.entries);
        Ok(())
    }
}

fn check_aliases(op: Opcode, tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(Error::NoTokens(op));
    }
    if tokens.iter().any(String::is_empty) {
        return Err(Error::EmptyToken(op));
    }
    Ok(())
}

fn build_index(entries: &[(Opcode, Vec<String>)]) -> HashMap<String, Opcode> {
    let mut index = HashMap::new();
    for (op, tokens) in entries {
        for token in tokens {
            index.entry(token.clone()).or_insert(*op);
        }
    }
    index
}
