//! Standard handlers for extension opcodes.
//!
//! Every function here has the [`Handler`] signature. Dialects bind them by
//! listing the opcode in their token table, or explicitly through
//! [`crate::dialect::DialectBuilder::handler`] (e.g. the pointer-advancing
//! `put`/`get` variants).

use crate::dialect::Handler;
use crate::error::Fault;
use crate::io::Io;
use crate::machine::Machine;
use crate::opcode::Opcode;

type OpResult = Result<(), Fault>;

/// The standard handler of an extension opcode. Core and custom opcodes have
/// none.
pub fn standard(op: Opcode) -> Option<Handler> {
    let handler: Handler = match op {
        Opcode::Nop | Opcode::EndBuf | Opcode::Com | Opcode::EndCom => nop,
        Opcode::Or => or,
        Opcode::And => and,
        Opcode::Xor => xor,
        Opcode::Not => not,
        Opcode::Shl => shl,
        Opcode::Shr => shr,
        Opcode::Njm => njm,
        Opcode::Pjm => pjm,
        Opcode::Zro => zro,
        Opcode::Hom => hom,
        Opcode::Buf => buf,
        _ => return None,
    };
    Some(handler)
}

pub fn nop(_: &mut Machine, _: &mut Io<'_>) -> OpResult {
    Ok(())
}

/// `cell[p+1] = f(cell[p], cell[p+1])`, leaving the pointer on `p+1`.
fn combine(m: &mut Machine, f: fn(i64, i64) -> i64) -> OpResult {
    let tape = m.tape_mut();
    let left = tape.get();
    tape.shift(1)?;
    let right = tape.get();
    tape.set(f(left, right))
}

pub fn or(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    combine(m, |a, b| a | b)
}

pub fn and(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    combine(m, |a, b| a & b)
}

pub fn xor(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    combine(m, |a, b| a ^ b)
}

/// Bitwise complement of the current cell within the cell width.
pub fn not(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let signed = m.dialect().config().signed_cell;
    let tape = m.tape_mut();
    let value = tape.get();
    let flipped = if signed { !value } else { !value & tape.mask() };
    tape.set(flipped)
}

pub fn shl(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let tape = m.tape_mut();
    tape.set(tape.get() << 1)
}

pub fn shr(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let tape = m.tape_mut();
    tape.set(tape.get() >> 1)
}

/// Move the pointer right by the current cell's value.
pub fn njm(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let tape = m.tape_mut();
    tape.shift(tape.get())
}

/// Move the pointer left by the current cell's value.
pub fn pjm(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let tape = m.tape_mut();
    tape.shift(-tape.get())
}

pub fn zro(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    m.tape_mut().set(0)
}

pub fn hom(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    m.tape_mut().seek(0)
}

/// Write the current instruction's literal, one code point per cell,
/// advancing the pointer after each.
pub fn buf(m: &mut Machine, _: &mut Io<'_>) -> OpResult {
    let ip = m.ip();
    let (_, tape, program) = m.parts_mut();
    let Some(literal) = program.get(ip).and_then(|i| i.literal.as_deref()) else {
        return Ok(());
    };
    for c in literal.chars() {
        tape.set(c as i64)?;
        tape.shift(1)?;
    }
    Ok(())
}

/// `put`, then move the pointer right.
pub fn put_advance(m: &mut Machine, io: &mut Io<'_>) -> OpResult {
    let mode = m.dialect().config().output;
    io.write_value(m.tape().get(), mode)?;
    m.tape_mut().shift(1)
}

/// `get`, then move the pointer right.
pub fn get_advance(m: &mut Machine, io: &mut Io<'_>) -> OpResult {
    let value = io.read_char()?;
    let tape = m.tape_mut();
    tape.set(value)?;
    tape.shift(1)
}
