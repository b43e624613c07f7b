//! # LC-3 VM
//!
//! A virtual machine for the 16-bit LC-3 style register architecture.
//!
//! The machine has a flat 65536-word address space, eight general purpose
//! registers, a program counter and an N/Z/P condition register. Programs
//! are raw binary images loaded at 0x3000 and talk to the world through
//! `TRAP` service routines.

pub mod cpu;
pub mod image;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Console, Cpu, CpuError, CpuState, Flag, Instruction, Memory, Reg, Registers, ORIGIN};
pub use image::{load_image, ByteOrder, Image, ImageError};
