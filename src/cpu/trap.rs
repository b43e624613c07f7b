//! Trap service routines.
//!
//! `TRAP x20`..`TRAP x27` call into eight built-in I/O routines. All of them
//! talk to the outside world through a [`Console`], which pairs a buffered
//! input stream with an output sink so the VM can run against the process
//! stdio or against in-memory buffers.

use crate::cpu::execute::{Cpu, CpuError, CpuState};
use crate::cpu::registers::R0;
use log::{debug, trace, warn};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Lowest valid trap vector.
pub const TRAP_BASE: u8 = 0x20;

/// Value stored in R0 when a character read hits end of input.
pub const END_OF_INPUT: u16 = 0xFFFF;

/// The trap vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TrapCode {
    /// Read one character into R0, no echo
    Getc = 0x20,
    /// Write the low byte of R0
    Out = 0x21,
    /// Write the zero-terminated string at mem[R0], one character per word
    Puts = 0x22,
    /// Read one character into R0 and echo it
    In = 0x23,
    /// Packed string output. Not provided by this machine; a no-op.
    Putsp = 0x24,
    /// Stop the CPU
    Halt = 0x25,
    /// Read an unsigned decimal number into R0
    InU16 = 0x26,
    /// Write R0 as an unsigned decimal number and a newline
    OutU16 = 0x27,
}

impl TrapCode {
    /// Position of this routine in the vector table.
    pub fn index(self) -> usize {
        (u8::from(self) - TRAP_BASE) as usize
    }
}

/// Character and number I/O for the trap routines.
pub struct Console<R, W> {
    input: R,
    output: W,
}

/// A console bound to the process stdin/stdout.
pub type StdConsole = Console<StdinLock<'static>, Stdout>;

impl StdConsole {
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.fill_buf()?.first().copied())
    }

    /// Read one raw byte, blocking until one is available.
    /// Returns `None` at end of input.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }

    /// Read a decimal number token.
    ///
    /// Leading whitespace and an optional `+` are skipped. Digits are
    /// consumed up to the first non-digit, which stays in the stream. The
    /// value is reduced modulo 65536. Returns `None` if no digit was found.
    pub fn read_u16(&mut self) -> io::Result<Option<u16>> {
        while let Some(byte) = self.peek_byte()? {
            if !byte.is_ascii_whitespace() {
                break;
            }
            self.input.consume(1);
        }
        if self.peek_byte()? == Some(b'+') {
            self.input.consume(1);
        }

        let mut value: Option<u16> = None;
        while let Some(byte) = self.peek_byte()? {
            if !byte.is_ascii_digit() {
                break;
            }
            self.input.consume(1);
            let digit = (byte - b'0') as u16;
            value = Some(value.unwrap_or(0).wrapping_mul(10).wrapping_add(digit));
        }
        Ok(value)
    }

    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.write_all(&[byte])
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        writeln!(self.output, "{}", value)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

impl Cpu {
    /// Run the trap routine selected by `vector`.
    pub(crate) fn trap<R: BufRead, W: Write>(
        &mut self,
        vector: u8,
        console: &mut Console<R, W>,
    ) -> Result<(), CpuError> {
        let code = TrapCode::try_from(vector)
            .map_err(|_| CpuError::InvalidTrapCode(vector))?;
        trace!("TRAP {:#04x} {:?}", vector, code);

        match code {
            TrapCode::Getc => {
                let ch = console.read_byte()?;
                self.regs.set(R0, ch.map_or(END_OF_INPUT, u16::from));
            }

            TrapCode::Out => {
                console.write_byte((self.regs.get(R0) & 0xFF) as u8)?;
                console.flush()?;
            }

            TrapCode::Puts => {
                let start = self.regs.get(R0);
                for cell in self.mem.cells_from(start).take_while(|cell| *cell != 0) {
                    console.write_byte((cell & 0xFF) as u8)?;
                }
                console.flush()?;
            }

            TrapCode::In => {
                let ch = console.read_byte()?;
                self.regs.set(R0, ch.map_or(END_OF_INPUT, u16::from));
                if let Some(ch) = ch {
                    console.write_byte(ch)?;
                    console.flush()?;
                }
            }

            TrapCode::Putsp => {
                debug!("PUTSP is not implemented; ignoring");
            }

            TrapCode::Halt => {
                debug!("HALT at {:#06x}", self.regs.pc.wrapping_sub(1));
                self.state = CpuState::Halted;
            }

            TrapCode::InU16 => match console.read_u16()? {
                Some(value) => self.regs.set(R0, value),
                None => warn!("IN_U16: no decimal number on input, R0 unchanged"),
            },

            TrapCode::OutU16 => {
                console.write_u16(self.regs.get(R0))?;
                console.flush()?;
            }
        }

        Ok(())
    }
}
