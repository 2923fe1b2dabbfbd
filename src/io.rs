use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

use crate::config::OutputMode;
use crate::error::Fault;

/// The input and output collaborators of a run.
///
/// Reads block until a character is available; end of input is
/// [`Fault::InputClosed`].
pub struct Io<'a> {
    input: &'a mut dyn Read,
    output: &'a mut dyn Write,
    /// Bytes read ahead while decoding and given back.
    pending: VecDeque<u8>,
}

impl<'a> Io<'a> {
    pub fn new(input: &'a mut dyn Read, output: &'a mut dyn Write) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    /// Read one UTF-8 character and return its code point.
    ///
    /// A byte that does not start a complete, valid sequence is returned as
    /// its raw value. Any bytes read past it are kept for the next call, so
    /// no input is lost.
    pub fn read_char(&mut self) -> Result<i64, Fault> {
        let first = self.read_byte()?.ok_or(Fault::InputClosed)?;
        let len = match first {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Ok(first as i64),
        };
        let mut buf = [first, 0, 0, 0];
        let mut filled = 1;
        while filled < len {
            match self.read_byte()? {
                Some(b @ 0x80..=0xBF) => {
                    buf[filled] = b;
                    filled += 1;
                }
                Some(b) => {
                    self.pending.push_front(b);
                    break;
                }
                None => break,
            }
        }
        if let Some(c) = std::str::from_utf8(&buf[..filled])
            .ok()
            .and_then(|s| s.chars().next())
        {
            return Ok(c as i64);
        }
        for &b in buf[1..filled].iter().rev() {
            self.pending.push_front(b);
        }
        Ok(first as i64)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Fault> {
        if let Some(b) = self.pending.pop_front() {
            return Ok(Some(b));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Fault::Io(e)),
            }
        }
    }

    /// Write a cell value according to `mode`.
    pub fn write_value(&mut self, value: i64, mode: OutputMode) -> Result<(), Fault> {
        match mode {
            OutputMode::Byte => self.write_bytes(&[value as u8]),
            OutputMode::Char => match u32::try_from(value).ok().and_then(char::from_u32) {
                Some(c) => {
                    let mut buf = [0u8; 4];
                    self.write_bytes(c.encode_utf8(&mut buf).as_bytes())
                }
                None => self.write_bytes(&[value as u8]),
            },
        }
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), Fault> {
        self.write_bytes(s.as_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        self.output.write_all(bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Fault> {
        self.output.flush()?;
        Ok(())
    }
}
