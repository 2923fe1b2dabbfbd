use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dialect::{Dialect, Handler};
use crate::error::{Direction, Error, Fault, Location, Result};
use crate::io::Io;
use crate::opcode::Opcode;
use crate::tape::Tape;
use crate::translate::Instruction;

/// The execution engine.
///
/// Holds the tape, the loaded program and the instruction pointer, and walks
/// the program one instruction at a time until the pointer passes its end.
/// Brackets are matched by scanning the program at jump time; nothing is
/// precomputed, so programs that rewrite themselves mid-run stay correct.
///
/// A machine is reusable: every run starts from a zeroed tape and fresh
/// registers.
pub struct Machine {
    dialect: Arc<Dialect>,
    tape: Tape,
    program: Vec<Instruction>,
    ip: usize,
    steps: usize,
}

impl Machine {
    pub fn new(dialect: Arc<Dialect>) -> Self {
        let tape = Tape::new(dialect.config());
        Self {
            dialect,
            tape,
            program: Vec::new(),
            ip: 0,
            steps: 0,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.program
    }

    /// Dialect, tape and program borrowed at once, for hooks that move data
    /// between the tape and the program.
    pub fn parts_mut(&mut self) -> (&Dialect, &mut Tape, &mut Vec<Instruction>) {
        (&*self.dialect, &mut self.tape, &mut self.program)
    }

    /// The instruction pointer.
    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn set_ip(&mut self, ip: usize) {
        self.ip = ip;
    }

    /// Number of instructions executed since the program was loaded.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The instruction under the instruction pointer.
    pub fn current(&self) -> Option<&Instruction> {
        self.program.get(self.ip)
    }

    pub fn is_halted(&self) -> bool {
        self.ip >= self.program.len()
    }

    /// Load `program` and reset the tape and registers.
    pub fn load(&mut self, program: Vec<Instruction>) {
        self.tape.reset(self.dialect.config().tape_size);
        self.program = program;
        self.ip = 0;
        self.steps = 0;
    }

    /// Run `program` to completion. Returns the number of executed
    /// instructions.
    pub fn run(
        &mut self,
        program: Vec<Instruction>,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<usize> {
        self.load(program);
        let mut io = Io::new(input, output);
        debug!(
            dialect = self.dialect.name(),
            instructions = self.program.len(),
            "run start"
        );
        self.begin(&mut io)?;
        while self.step(&mut io)? {}
        self.finish(&mut io)?;
        debug!(steps = self.steps, "run complete");
        Ok(self.steps)
    }

    /// Compile `source` with this machine's dialect and run it.
    pub fn run_source(
        &mut self,
        source: &str,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<usize> {
        let program = self.dialect.compile(source)?;
        self.run(program, input, output)
    }

    /// Run the pre-run hook on the loaded program.
    pub fn begin(&mut self, io: &mut Io<'_>) -> Result<()> {
        let hook = self.dialect.hooks().pre_run;
        self.call_hook(hook, io)
    }

    /// Run the post-run hook and flush the output.
    pub fn finish(&mut self, io: &mut Io<'_>) -> Result<()> {
        let hook = self.dialect.hooks().post_run;
        self.call_hook(hook, io)?;
        io.flush().map_err(|fault| self.locate(fault, None, self.ip))
    }

    /// Execute one instruction. Returns `false` once the instruction pointer
    /// is past the end of the program.
    pub fn step(&mut self, io: &mut Io<'_>) -> Result<bool> {
        let Some(op) = self.current().map(|i| i.opcode) else {
            return Ok(false);
        };
        let ip = self.ip;
        if let Some(limit) = self.dialect.config().step_limit {
            if self.steps >= limit {
                return Err(self.locate(Fault::StepLimit(limit), Some(op), ip));
            }
        }
        trace!(ip, dp = self.tape.ptr(), %op, "step");

        self.dispatch(op, io)
            .map_err(|fault| self.locate(fault, Some(op), ip))?;
        self.ip += 1;
        self.steps += 1;

        if let Some(hook) = self.dialect.hooks().step {
            hook(self, io).map_err(|fault| self.locate(fault, Some(op), ip))?;
        }
        Ok(true)
    }

    fn dispatch(&mut self, op: Opcode, io: &mut Io<'_>) -> std::result::Result<(), Fault> {
        if let Some(handler) = self.dialect.handler(op) {
            return handler(self, io);
        }
        match op {
            Opcode::Nxt => self.tape.shift(1),
            Opcode::Prv => self.tape.shift(-1),
            Opcode::Inc => self.tape.add(1),
            Opcode::Dec => self.tape.add(-1),
            Opcode::Put => io.write_value(self.tape.get(), self.dialect.config().output),
            Opcode::Get => {
                let value = io.read_char()?;
                self.tape.set(value)
            }
            Opcode::Opn if self.tape.get() == 0 => self.jump_forward(),
            Opcode::Cls if self.tape.get() != 0 => self.jump_backward(),
            Opcode::Opn | Opcode::Cls => Ok(()),
            other => Err(Fault::NoHandler(other)),
        }
    }

    /// Move the instruction pointer onto the `cls` matching the `opn` under
    /// it.
    pub fn jump_forward(&mut self) -> std::result::Result<(), Fault> {
        let mut depth = 0usize;
        for i in self.ip + 1..self.program.len() {
            match self.program[i].opcode {
                Opcode::Opn => depth += 1,
                Opcode::Cls if depth == 0 => {
                    self.ip = i;
                    return Ok(());
                }
                Opcode::Cls => depth -= 1,
                _ => {}
            }
        }
        Err(Fault::UnmatchedBracket {
            direction: Direction::Forward,
        })
    }

    /// Move the instruction pointer onto the `opn` matching the `cls` under
    /// it.
    pub fn jump_backward(&mut self) -> std::result::Result<(), Fault> {
        let mut depth = 0usize;
        for i in (0..self.ip.min(self.program.len())).rev() {
            match self.program[i].opcode {
                Opcode::Cls => depth += 1,
                Opcode::Opn if depth == 0 => {
                    self.ip = i;
                    return Ok(());
                }
                Opcode::Opn => depth -= 1,
                _ => {}
            }
        }
        Err(Fault::UnmatchedBracket {
            direction: Direction::Backward,
        })
    }

    fn call_hook(&mut self, hook: Option<Handler>, io: &mut Io<'_>) -> Result<()> {
        match hook {
            Some(hook) => hook(self, io).map_err(|fault| self.locate(fault, None, self.ip)),
            None => Ok(()),
        }
    }

    fn locate(&self, fault: Fault, op: Option<Opcode>, ip: usize) -> Error {
        Error::Runtime {
            fault,
            location: Location {
                op,
                ip,
                dp: self.tape.ptr(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgePolicy, MachineConfig};
    use crate::dialects;
    use crate::table::TokenTable;
    use crate::translate::program;

    fn bf_with(config: MachineConfig) -> Machine {
        let table = TokenTable::core([">", "<", "+", "-", ".", ",", "[", "]"]).unwrap();
        let dialect = Dialect::builder("bf", table).config(config).build().unwrap();
        Machine::new(Arc::new(dialect))
    }

    fn bf() -> Machine {
        bf_with(MachineConfig::default())
    }

    fn run(machine: &mut Machine, source: &str, input: &str) -> Result<String> {
        let mut input = input.as_bytes();
        let mut output = Vec::new();
        machine.run_source(source, &mut input, &mut output)?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn fault_of(err: Error) -> (Fault, Location) {
        match err {
            Error::Runtime { fault, location } => (fault, location),
            other => panic!("expected a runtime error, got {other}"),
        }
    }

    #[test]
    fn test_hello_world() {
        let out = run(&mut bf(), dialects::HELLO_WORLD, "").unwrap();
        assert_eq!(out, "Hello World!\n");
    }

    #[test]
    fn test_echo_input() {
        let out = run(&mut bf(), ",.>,.", "hi").unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn test_input_closed_is_fatal() {
        let err = run(&mut bf(), ",", "").unwrap_err();
        let (fault, location) = fault_of(err);
        assert!(matches!(fault, Fault::InputClosed));
        assert_eq!(location.op, Some(Opcode::Get));
    }

    #[test]
    fn test_unmatched_open_is_fatal() {
        let err = run(&mut bf(), "[", "").unwrap_err();
        let (fault, location) = fault_of(err);
        assert!(matches!(
            fault,
            Fault::UnmatchedBracket {
                direction: Direction::Forward
            }
        ));
        assert_eq!(
            location,
            Location {
                op: Some(Opcode::Opn),
                ip: 0,
                dp: 0
            }
        );
    }

    #[test]
    fn test_unmatched_close_is_fatal() {
        let err = run(&mut bf(), "+>+]", "").unwrap_err();
        let (fault, location) = fault_of(err);
        assert!(matches!(
            fault,
            Fault::UnmatchedBracket {
                direction: Direction::Backward
            }
        ));
        assert_eq!(location.ip, 3);
        assert_eq!(location.dp, 1);
    }

    #[test]
    fn test_open_on_nonzero_falls_through() {
        // The unmatched `[` is never searched because the cell is nonzero.
        let out = run(&mut bf(), "+[.", "").unwrap();
        assert_eq!(out, "\u{1}");
    }

    #[test]
    fn test_close_on_zero_falls_through() {
        assert!(run(&mut bf(), "]", "").is_ok());
    }

    #[test]
    fn test_nested_loops() {
        // 3 * 4 via nested loops, then print 'A' (65) = 12 + 53.
        let mut machine = bf();
        let source = "+++[>++++[>+<-]<-]>>".to_string() + &"+".repeat(53) + ".";
        let out = run(&mut machine, &source, "").unwrap();
        assert_eq!(out, "A");
        assert_eq!(machine.tape().get_at(2), Some(65));
        assert_eq!(machine.tape().get_at(0), Some(0));
    }

    #[test]
    fn test_skip_loop_with_nested_brackets() {
        let out = run(&mut bf(), "[[+]+]+.", "").unwrap();
        assert_eq!(out, "\u{1}");
    }

    #[test]
    fn test_pointer_below_zero() {
        let err = run(&mut bf(), "<", "").unwrap_err();
        let (fault, _) = fault_of(err);
        assert!(matches!(fault, Fault::PointerOutOfRange { target: -1, .. }));
    }

    #[test]
    fn test_pointer_wraps_when_enabled() {
        let mut machine = bf_with(MachineConfig {
            tape_size: 10,
            edge: EdgePolicy::Wrap,
            ..Default::default()
        });
        run(&mut machine, "<+", "").unwrap();
        assert_eq!(machine.tape().ptr(), 9);
        assert_eq!(machine.tape().get_at(9), Some(1));
    }

    #[test]
    fn test_pointer_past_end() {
        let mut machine = bf_with(MachineConfig {
            tape_size: 2,
            ..Default::default()
        });
        let (fault, location) = fault_of(run(&mut machine, ">>", "").unwrap_err());
        assert!(matches!(fault, Fault::PointerOutOfRange { target: 2, len: 2 }));
        assert_eq!(location.ip, 1);
    }

    #[test]
    fn test_infinite_tape() {
        let mut machine = bf_with(MachineConfig {
            tape_size: 1,
            edge: EdgePolicy::Grow,
            ..Default::default()
        });
        run(&mut machine, ">>>+", "").unwrap();
        assert_eq!(machine.tape().len(), 4);
        assert_eq!(machine.tape().get_at(3), Some(1));
    }

    #[test]
    fn test_cell_overflow_without_wrap() {
        let mut machine = bf();
        let source = "+".repeat(256);
        let (fault, location) = fault_of(run(&mut machine, &source, "").unwrap_err());
        assert!(matches!(fault, Fault::CellOverflow { value: 256, .. }));
        assert_eq!(location.ip, 255);
        assert_eq!(location.op, Some(Opcode::Inc));
    }

    #[test]
    fn test_cell_wraps_when_enabled() {
        let mut machine = bf_with(MachineConfig {
            wrap_cell: true,
            ..Default::default()
        });
        run(&mut machine, "-", "").unwrap();
        assert_eq!(machine.tape().get(), 255);
        let source = "+".repeat(256);
        run(&mut machine, &source, "").unwrap();
        assert_eq!(machine.tape().get(), 0);
    }

    #[test]
    fn test_step_limit() {
        let mut machine = bf_with(MachineConfig {
            step_limit: Some(100),
            ..Default::default()
        });
        let (fault, _) = fault_of(run(&mut machine, "+[]", "").unwrap_err());
        assert!(matches!(fault, Fault::StepLimit(100)));
        assert_eq!(machine.steps(), 100);
    }

    #[test]
    fn test_run_returns_step_count() {
        let mut machine = bf();
        let mut input: &[u8] = &[];
        let mut output = Vec::new();
        let steps = machine
            .run(program([Opcode::Inc, Opcode::Inc]), &mut input, &mut output)
            .unwrap();
        assert_eq!(steps, 2);
        assert!(machine.is_halted());
    }

    #[test]
    fn test_runs_are_independent() {
        let mut machine = bf();
        run(&mut machine, "+++>++", "").unwrap();
        run(&mut machine, "+", "").unwrap();
        assert_eq!(machine.tape().get_at(0), Some(1));
        assert_eq!(machine.tape().get_at(1), Some(0));
        assert_eq!(machine.tape().ptr(), 0);
    }

    #[test]
    fn test_extension_opcode_without_handler() {
        let mut machine = bf();
        let mut input: &[u8] = &[];
        let mut output = Vec::new();
        let err = machine
            .run(program([Opcode::Zro]), &mut input, &mut output)
            .unwrap_err();
        assert!(matches!(fault_of(err).0, Fault::NoHandler(Opcode::Zro)));
    }

    #[test]
    fn test_single_stepping() {
        let mut machine = bf();
        machine.load(program([Opcode::Inc, Opcode::Nxt, Opcode::Inc]));
        let mut input: &[u8] = &[];
        let mut output = Vec::new();
        let mut io = Io::new(&mut input, &mut output);
        machine.begin(&mut io).unwrap();
        assert!(machine.step(&mut io).unwrap());
        assert_eq!(machine.ip(), 1);
        assert_eq!(machine.tape().get(), 1);
        while machine.step(&mut io).unwrap() {}
        machine.finish(&mut io).unwrap();
        assert_eq!(machine.tape().ptr(), 1);
        assert_eq!(machine.steps(), 3);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::{EdgePolicy, MachineConfig};
    use crate::table::TokenTable;
    use proptest::prelude::*;

    /// Random bracket-balanced programs. Every loop body ends by clearing
    /// the current cell, so each loop exits after at most one iteration.
    fn balanced() -> impl Strategy<Value = String> {
        let leaf = prop::sample::select(vec!["+", "-", ">", "<", "."]).prop_map(str::to_string);
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop::collection::vec(inner, 0..8).prop_map(|parts| format!("[{}[-]]", parts.concat()))
        })
    }

    fn machine(step_limit: usize) -> Machine {
        let table = TokenTable::core([">", "<", "+", "-", ".", ",", "[", "]"]).unwrap();
        let config = MachineConfig {
            tape_size: 64,
            wrap_cell: true,
            edge: EdgePolicy::Wrap,
            step_limit: Some(step_limit),
            ..Default::default()
        };
        Machine::new(Arc::new(Dialect::builder("bf", table).config(config).build().unwrap()))
    }

    proptest! {
        #[test]
        fn balanced_programs_terminate(parts in prop::collection::vec(balanced(), 0..8)) {
            let source = parts.concat();
            let mut m = machine(1_000_000);
            let mut input: &[u8] = &[];
            let mut output = Vec::new();
            m.run_source(&source, &mut input, &mut output).unwrap();
            prop_assert_eq!(m.ip(), m.program().len());
        }

        #[test]
        fn runs_are_deterministic(
            source in "[-+<>.,\\[\\]]{0,48}",
            input in prop::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut first = machine(10_000);
            let mut second = machine(10_000);
            let mut out1 = Vec::new();
            let mut out2 = Vec::new();
            let r1 = first.run_source(&source, &mut input.as_slice(), &mut out1);
            let r2 = second.run_source(&source, &mut input.as_slice(), &mut out2);
            prop_assert_eq!(r1.is_ok(), r2.is_ok());
            prop_assert_eq!(out1, out2);
            prop_assert_eq!(first.tape().cells(), second.tape().cells());
        }
    }
}
