//! Token sequence to program and back.

use crate::config::{RegionKind, Syntax};
use crate::error::Result;
use crate::lexer::Token;
use crate::opcode::Opcode;
use crate::table::TokenTable;

/// One program element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Payload captured by a literal region, used by `buf`.
    pub literal: Option<String>,
}

impl From<Opcode> for Instruction {
    fn from(opcode: Opcode) -> Self {
        Self {
            opcode,
            literal: None,
        }
    }
}

/// Map tokens to instructions.
pub fn translate(table: &TokenTable, tokens: &[Token]) -> Result<Vec<Instruction>> {
    tokens
        .iter()
        .map(|token| {
            Ok(Instruction {
                opcode: table.opcode_of(&token.text)?,
                literal: token.literal.clone(),
            })
        })
        .collect()
}

/// Build a literal-free program from bare opcodes.
pub fn program<I: IntoIterator<Item = Opcode>>(opcodes: I) -> Vec<Instruction> {
    opcodes.into_iter().map(Instruction::from).collect()
}

/// The opcodes of a program.
pub fn opcodes(program: &[Instruction]) -> Vec<Opcode> {
    program.iter().map(|i| i.opcode).collect()
}

/// Canonical token of every instruction.
pub fn to_tokens<'t>(table: &'t TokenTable, program: &[Instruction]) -> Result<Vec<&'t str>> {
    program
        .iter()
        .map(|i| table.token_of(i.opcode, 0))
        .collect()
}

/// Render a program as source text of `table`.
///
/// Tokens are joined with the syntax's first separator. An instruction that
/// carries a literal and opens a literal region is written as its token, the
/// literal and the canonical closing token.
pub fn to_source(table: &TokenTable, syntax: &Syntax, program: &[Instruction]) -> Result<String> {
    let mut parts = Vec::with_capacity(program.len());
    for instruction in program {
        let token = table.token_of(instruction.opcode, 0)?;
        let region = syntax
            .regions
            .iter()
            .find(|r| r.open == instruction.opcode && r.kind == RegionKind::Literal);
        match (region, &instruction.literal) {
            (Some(region), Some(literal)) => {
                let close = table.token_of(region.close, 0)?;
                parts.push(format!("{token}{literal}{close}"));
            }
            _ => parts.push(token.to_string()),
        }
    }
    Ok(parts.join(syntax.separator()))
}
