//! CPU emulation for the LC-3.
//!
//! This module implements the complete machine:
//! - 65536 sixteen-bit memory cells
//! - R0..R7, PC and a single-flag N/Z/P condition register
//! - 16 opcodes and 8 trap service routines

pub mod memory;
pub mod registers;
pub mod addressing;
pub mod decode;
pub mod execute;
pub mod trap;

pub use memory::Memory;
pub use registers::{Flag, Reg, Registers};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, ORIGIN};
pub use trap::{Console, StdConsole, TrapCode};
