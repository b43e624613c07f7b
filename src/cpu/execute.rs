//! CPU execution engine for the LC-3.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::addressing::{base_offset, pc_relative};
use crate::cpu::decode::{self, DecodeError, Instruction, JsrTarget, Operand};
use crate::cpu::registers::LINK;
use crate::cpu::trap::Console;
use crate::cpu::{Memory, Registers};
use crate::image::Image;
use log::{trace, warn};
use serde::{Serialize, Deserialize};
use std::io::{BufRead, Write};
use thiserror::Error;

/// Address where images are placed and execution starts (before offset).
pub const ORIGIN: u16 = 0x3000;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed TRAP x25).
    Halted,
    /// An instruction failed; nothing further will execute.
    Faulted,
}

/// The LC-3 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Retired instruction count.
    pub cycles: u64,
    /// Last executed instruction (for tracing).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Place `words` at `ORIGIN + offset` and point the PC at the first one.
    ///
    /// Words that would not fit below the top of memory are dropped. Returns
    /// the number of words written.
    pub fn load_program(&mut self, offset: u16, words: &[u16]) -> usize {
        let entry = ORIGIN.wrapping_add(offset);
        let written = self.mem.load(entry, words);
        if written < words.len() {
            warn!(
                "image truncated: {} of {} words fit between {:#06x} and 0xffff",
                written,
                words.len(),
                entry
            );
        }
        self.regs.jump(entry);
        written
    }

    /// Load an image at `ORIGIN + offset`.
    pub fn load_image(&mut self, image: &Image, offset: u16) -> usize {
        self.load_program(offset, &image.words)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. Any error
    /// other than `NotRunning` leaves the CPU in the `Faulted` state.
    pub fn step<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let result = self.fetch_and_execute(console);
        if result.is_err() {
            self.state = CpuState::Faulted;
        }
        result
    }

    fn fetch_and_execute<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<Instruction, CpuError> {
        // Fetch, then advance PC before decode so offsets are relative to
        // the next instruction
        let pc = self.regs.advance_pc();
        let word = self.mem.read(pc);

        let instr = decode::decode(word)?;
        trace!("{:#06x}: {:#06x} {:?}", pc, word, instr);

        self.execute(instr, console)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(console)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        max_cycles: u64,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(console)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute<R: BufRead, W: Write>(
        &mut self,
        instr: Instruction,
        console: &mut Console<R, W>,
    ) -> Result<(), CpuError> {
        let pc = self.regs.pc;

        match instr {
            // ==================== Operate ====================

            Instruction::Add { dr, sr1, operand } => {
                let value = self.regs.get(sr1).wrapping_add(self.operand(operand));
                self.regs.write(dr, value);
            }

            Instruction::And { dr, sr1, operand } => {
                let value = self.regs.get(sr1) & self.operand(operand);
                self.regs.write(dr, value);
            }

            Instruction::Not { dr, sr } => {
                let value = !self.regs.get(sr);
                self.regs.write(dr, value);
            }

            // ==================== Data Movement ====================

            Instruction::Ld { dr, offset } => {
                let value = self.mem.read(pc_relative(pc, offset));
                self.regs.write(dr, value);
            }

            Instruction::Ldi { dr, offset } => {
                let ptr = self.mem.read(pc_relative(pc, offset));
                let value = self.mem.read(ptr);
                self.regs.write(dr, value);
            }

            Instruction::Ldr { dr, base, offset } => {
                let addr = base_offset(self.regs.get(base), offset);
                let value = self.mem.read(addr);
                self.regs.write(dr, value);
            }

            Instruction::Lea { dr, offset } => {
                self.regs.write(dr, pc_relative(pc, offset));
            }

            Instruction::St { sr, offset } => {
                self.mem.write(pc_relative(pc, offset), self.regs.get(sr));
            }

            Instruction::Sti { sr, offset } => {
                let ptr = self.mem.read(pc_relative(pc, offset));
                self.mem.write(ptr, self.regs.get(sr));
            }

            Instruction::Str { sr, base, offset } => {
                let addr = base_offset(self.regs.get(base), offset);
                self.mem.write(addr, self.regs.get(sr));
            }

            // ==================== Control ====================

            Instruction::Br { mask, offset } => {
                if self.regs.cond.bits() & mask != 0 {
                    self.regs.jump(pc_relative(pc, offset));
                }
            }

            Instruction::Jmp { base } => {
                self.regs.jump(self.regs.get(base));
            }

            Instruction::Jsr { target } => {
                // Resolve before linking: JSRR R7 jumps to the old R7
                let target = match target {
                    JsrTarget::Offset(offset) => pc_relative(pc, offset),
                    JsrTarget::Register(base) => self.regs.get(base),
                };
                self.regs.set(LINK, pc);
                self.regs.jump(target);
            }

            Instruction::Trap { vector } => {
                self.trap(vector, console)?;
            }

            // ==================== Reserved ====================

            Instruction::Rti | Instruction::Res => {}
        }

        Ok(())
    }

    fn operand(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Register(r) => self.regs.get(r),
            Operand::Immediate(value) => value,
        }
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("invalid trap code: {0:#04x}")]
    InvalidTrapCode(u8),

    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
}
