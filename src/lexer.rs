use tracing::debug;

use crate::config::{LexMode, Region, RegionKind, Syntax};
use crate::error::{Error, Result};
use crate::opcode::Opcode;
use crate::table::TokenTable;

/// A recognized token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The matched source text, always a token of the table.
    pub text: String,
    /// Raw text captured by a literal region opened by this token.
    pub literal: Option<String>,
    /// Byte offset of the match in the source.
    pub offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            literal: None,
            offset,
        }
    }
}

/// Lexer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    /// Source text after the last match that contains no further token.
    /// Lexing stops there without an error.
    pub trailing: String,
}

impl Lexed {
    /// The matched token texts.
    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Turns source text into tokens of one token table.
pub struct Lexer<'a> {
    table: &'a TokenTable,
    syntax: &'a Syntax,
}

/// Cached position of a candidate's next occurrence.
#[derive(Clone, Copy)]
enum Next {
    Unknown,
    At(usize),
    Never,
}

impl<'a> Lexer<'a> {
    pub fn new(table: &'a TokenTable, syntax: &'a Syntax) -> Self {
        Self { table, syntax }
    }

    pub fn lex(&self, source: &str) -> Result<Lexed> {
        match self.syntax.mode {
            LexMode::Scan => self.scan(source),
            LexMode::Delimited => Ok(self.delimited(source)),
        }
    }

    /// Longest-match, leftmost-bias scan.
    ///
    /// At every step the candidate occurring earliest in the rest of the
    /// source wins; among candidates starting at the same offset the longer
    /// one wins. Text between matches is skipped.
    fn scan(&self, source: &str) -> Result<Lexed> {
        let candidates = self.table.all_tokens();
        let mut next = vec![Next::Unknown; candidates.len()];
        let mut tokens = Vec::new();
        let mut cursor = 0;

        while cursor < source.len() {
            let Some((start, text)) = earliest(source, cursor, &candidates, &mut next) else {
                break;
            };
            let after = start + text.len();
            let op = self.table.opcode_of(text)?;

            match self.region_opened_by(op) {
                None => {
                    tokens.push(Token::new(text, start));
                    cursor = after;
                }
                Some(region) => {
                    let close = self
                        .table
                        .aliases(region.close)
                        .map(|aliases| aliases.iter().map(String::as_str).collect::<Vec<_>>())
                        .unwrap_or_default();
                    let mut close_next = vec![Next::Unknown; close.len()];
                    let end = earliest(source, after, &close, &mut close_next);
                    match (region.kind, end) {
                        (RegionKind::Literal, Some((end_start, end_text))) => {
                            tokens.push(Token {
                                text: text.to_string(),
                                literal: Some(source[after..end_start].to_string()),
                                offset: start,
                            });
                            cursor = end_start + end_text.len();
                        }
                        (RegionKind::Literal, None) => {
                            debug!(offset = start, "literal region never closed, dropped");
                            cursor = after;
                        }
                        (RegionKind::Comment, Some((end_start, end_text))) => {
                            cursor = end_start + end_text.len();
                        }
                        (RegionKind::Comment, None) => {
                            return Err(Error::UnterminatedComment { offset: start });
                        }
                    }
                }
            }
        }

        let trailing = source[cursor.min(source.len())..].to_string();
        if !trailing.trim().is_empty() {
            debug!(
                offset = cursor,
                bytes = trailing.len(),
                "unrecognized trailing text ignored"
            );
        }
        Ok(Lexed { tokens, trailing })
    }

    /// Exact matching of separator-delimited chunks.
    fn delimited(&self, source: &str) -> Lexed {
        let mut tokens = Vec::new();
        for (offset, chunk) in split_chunks(source, &self.syntax.separators) {
            if self.table.opcode_of(chunk).is_ok() {
                tokens.push(Token::new(chunk, offset));
            } else {
                debug!(offset, chunk, "skipping unrecognized chunk");
            }
        }
        Lexed {
            tokens,
            trailing: String::new(),
        }
    }

    fn region_opened_by(&self, op: Opcode) -> Option<Region> {
        self.syntax.regions.iter().find(|r| r.open == op).copied()
    }
}

/// Find the earliest occurrence at or after `from` among `candidates`,
/// preferring the longer candidate on ties. `next` caches per-candidate
/// results between calls with a non-decreasing `from`.
fn earliest<'c>(
    source: &str,
    from: usize,
    candidates: &[&'c str],
    next: &mut [Next],
) -> Option<(usize, &'c str)> {
    let mut best: Option<(usize, &'c str)> = None;
    for (&candidate, slot) in candidates.iter().zip(next.iter_mut()) {
        let pos = match *slot {
            Next::At(pos) if pos >= from => pos,
            Next::Never => continue,
            _ => match source[from..].find(candidate) {
                Some(rel) => {
                    *slot = Next::At(from + rel);
                    from + rel
                }
                None => {
                    *slot = Next::Never;
                    continue;
                }
            },
        };
        let better = match best {
            None => true,
            Some((best_pos, best_text)) => {
                pos < best_pos || (pos == best_pos && candidate.len() > best_text.len())
            }
        };
        if better {
            best = Some((pos, candidate));
        }
    }
    best
}

/// Split `source` on any of `separators`, dropping empty chunks. With no
/// separators, whitespace delimits.
fn split_chunks<'s>(source: &'s str, separators: &[String]) -> Vec<(usize, &'s str)> {
    let mut chunks = Vec::new();
    let separators: Vec<&str> = separators
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if separators.is_empty() {
        let base = source.as_ptr() as usize;
        for chunk in source.split_whitespace() {
            chunks.push((chunk.as_ptr() as usize - base, chunk));
        }
        return chunks;
    }

    let mut next = vec![Next::Unknown; separators.len()];
    let mut cursor = 0;
    while cursor < source.len() {
        let (end, sep_len) = match earliest(source, cursor, &separators, &mut next) {
            Some((pos, sep)) => (pos, sep.len()),
            None => (source.len(), 0),
        };
        if end > cursor {
            chunks.push((cursor, &source[cursor..end]));
        }
        cursor = end + sep_len;
    }
    chunks
}
