//! Code/data synchronization for self-modifying dialects.
//!
//! A synchronized dialect keeps its program mirrored onto the tape: cell `i`
//! holds the table position of instruction `i`. Writing to those cells
//! rewrites the program, and the program is copied back so both buffers
//! agree after every step.
//!
//! Copies never reach past the end of the tape.

use crate::error::Fault;
use crate::io::Io;
use crate::machine::Machine;
use crate::table::TokenTable;
use crate::tape::Tape;
use crate::translate::Instruction;

/// Store each instruction's table position in the cell of the same index.
pub fn tape_from_program(
    table: &TokenTable,
    program: &[Instruction],
    tape: &mut Tape,
) -> Result<(), Fault> {
    let end = program.len().min(tape.len());
    for (i, instruction) in program[..end].iter().enumerate() {
        let position = table
            .position(instruction.opcode)
            .ok_or(Fault::Unmapped(instruction.opcode))?;
        tape.set_at(i, position as i64)?;
    }
    Ok(())
}

/// Rebuild the program from the tape.
///
/// Covers the whole program and every cell up to the last nonzero one, so
/// values written past the end of the program extend it. Instructions whose
/// opcode did not change keep their literal.
pub fn program_from_tape(
    table: &TokenTable,
    tape: &Tape,
    program: &mut Vec<Instruction>,
) -> Result<(), Fault> {
    let cells = tape.cells();
    let used = cells.iter().rposition(|&v| v != 0).map_or(0, |i| i + 1);
    let end = program.len().max(used).min(cells.len());
    let opcodes: Vec<_> = table.opcodes().collect();
    for (index, &value) in cells[..end].iter().enumerate() {
        let opcode = usize::try_from(value)
            .ok()
            .and_then(|v| opcodes.get(v).copied())
            .ok_or(Fault::UnknownCell { index, value })?;
        match program.get_mut(index) {
            Some(existing) if existing.opcode == opcode => {}
            Some(existing) => *existing = Instruction::from(opcode),
            None => program.push(Instruction::from(opcode)),
        }
    }
    Ok(())
}

/// Pre-run hook: mirror the loaded program onto the tape.
pub fn sync_pre(m: &mut Machine, _: &mut Io<'_>) -> Result<(), Fault> {
    let (dialect, tape, program) = m.parts_mut();
    tape_from_program(dialect.table(), program, tape)
}

/// Step hook: take tape edits into the program, then mirror it back.
pub fn sync_step(m: &mut Machine, _: &mut Io<'_>) -> Result<(), Fault> {
    let (dialect, tape, program) = m.parts_mut();
    program_from_tape(dialect.table(), tape, program)?;
    tape_from_program(dialect.table(), program, tape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgePolicy, MachineConfig};
    use crate::opcode::Opcode;
    use crate::translate::{opcodes, program};

    fn table() -> TokenTable {
        TokenTable::new([
            (Opcode::Nop, vec!["n"]),
            (Opcode::Inc, vec!["+"]),
            (Opcode::Dec, vec!["-"]),
            (Opcode::Nxt, vec![">"]),
        ])
        .unwrap()
    }

    fn tape(size: usize) -> Tape {
        Tape::new(&MachineConfig {
            tape_size: size,
            cell_width: 3,
            wrap_cell: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_tape_from_program_writes_positions() {
        let mut t = tape(6);
        let p = program([Opcode::Inc, Opcode::Nxt, Opcode::Nop, Opcode::Dec]);
        tape_from_program(&table(), &p, &mut t).unwrap();
        assert_eq!(t.cells(), &[1, 3, 0, 2, 0, 0]);
    }

    #[test]
    fn test_tape_from_program_is_bounded_by_tape() {
        let mut t = tape(2);
        let p = program([Opcode::Inc, Opcode::Inc, Opcode::Inc]);
        tape_from_program(&table(), &p, &mut t).unwrap();
        assert_eq!(t.cells(), &[1, 1]);
    }

    #[test]
    fn test_unmapped_opcode() {
        let mut t = tape(4);
        let p = program([Opcode::Put]);
        assert!(matches!(
            tape_from_program(&table(), &p, &mut t),
            Err(Fault::Unmapped(Opcode::Put))
        ));
    }

    #[test]
    fn test_program_from_tape_rewrites_and_extends() {
        let mut t = tape(6);
        t.set_at(0, 2).unwrap();
        t.set_at(3, 3).unwrap();
        let mut p = program([Opcode::Inc, Opcode::Inc]);
        program_from_tape(&table(), &t, &mut p).unwrap();
        assert_eq!(
            opcodes(&p),
            vec![Opcode::Dec, Opcode::Nop, Opcode::Nop, Opcode::Nxt]
        );
    }

    #[test]
    fn test_program_from_tape_keeps_unchanged_literals() {
        let mut t = tape(4);
        t.set_at(0, 1).unwrap();
        let mut p = vec![Instruction {
            opcode: Opcode::Inc,
            literal: Some("x".to_string()),
        }];
        program_from_tape(&table(), &t, &mut p).unwrap();
        assert_eq!(p[0].literal.as_deref(), Some("x"));
    }

    #[test]
    fn test_cell_outside_table_faults() {
        let mut t = tape(4);
        t.set_at(1, 7).unwrap();
        let mut p = Vec::new();
        assert!(matches!(
            program_from_tape(&table(), &t, &mut p),
            Err(Fault::UnknownCell { index: 1, value: 7 })
        ));
    }

    #[test]
    fn test_grown_tape_is_covered() {
        let mut t = Tape::new(&MachineConfig {
            tape_size: 1,
            edge: EdgePolicy::Grow,
            ..Default::default()
        });
        t.set_at(2, 1).unwrap();
        let mut p = Vec::new();
        program_from_tape(&table(), &t, &mut p).unwrap();
        assert_eq!(opcodes(&p), vec![Opcode::Nop, Opcode::Nop, Opcode::Inc]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::opcode::Opcode;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mirrored_program_reads_back(ops in prop::collection::vec(0usize..4, 0..16)) {
            let table = TokenTable::new([
                (Opcode::Nop, vec!["n"]),
                (Opcode::Inc, vec!["+"]),
                (Opcode::Dec, vec!["-"]),
                (Opcode::Nxt, vec![">"]),
            ])
            .unwrap();
            let all: Vec<Opcode> = table.opcodes().collect();
            let original = crate::translate::program(ops.iter().map(|&i| all[i]));
            let mut tape = Tape::new(&MachineConfig { tape_size: 32, ..Default::default() });
            tape_from_program(&table, &original, &mut tape).unwrap();
            let mut copy = original.clone();
            program_from_tape(&table, &tape, &mut copy).unwrap();
            prop_assert_eq!(copy, original);
        }
    }
}
