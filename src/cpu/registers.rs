//! LC-3 register file.
//!
//! The machine has:
//! - R0..R7: eight 16-bit general purpose registers (R7 is the JSR link)
//! - PC: 16-bit program counter
//! - COND: condition register holding exactly one of N, Z or P

use serde::{Serialize, Deserialize};
use std::fmt;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Trap argument and result register.
pub const R0: Reg = Reg(0);

/// Register used by JSR/JSRR to hold the return address.
pub const LINK: Reg = Reg(7);

/// A 3-bit general purpose register selector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    /// Extract the 3-bit selector that starts at bit `shift` of `word`.
    #[inline]
    pub const fn from_field(word: u16, shift: u32) -> Self {
        Self(((word >> shift) & 0x7) as u8)
    }

    /// Create a selector from a register number.
    ///
    /// # Panics
    /// Panics if `n` is not in 0..8.
    pub fn new(n: u8) -> Self {
        assert!((n as usize) < REGISTER_COUNT, "register R{} does not exist", n);
        Self(n)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Condition flag. The discriminants line up with the n/z/p bits of a
/// BR condition mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Flag {
    /// Last written value was positive (bit 15 clear, nonzero)
    Positive = 0b001,
    /// Last written value was zero
    Zero = 0b010,
    /// Last written value had bit 15 set
    Negative = 0b100,
}

impl Flag {
    /// Classify a register value.
    #[inline]
    pub fn from_value(value: u16) -> Self {
        if value == 0 {
            Flag::Zero
        } else if value >> 15 == 1 {
            Flag::Negative
        } else {
            Flag::Positive
        }
    }

    /// Bit pattern of this flag within a 3-bit n/z/p mask.
    #[inline]
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

/// The LC-3 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0..R7
    pub gpr: [u16; REGISTER_COUNT],

    /// Program counter
    pub pc: u16,

    /// Condition register.
    /// Starts at Z, matching the all-zero general registers.
    pub cond: Flag,
}

impl Registers {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self {
            gpr: [0; REGISTER_COUNT],
            pc: 0,
            cond: Flag::Zero,
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn get(&self, r: Reg) -> u16 {
        self.gpr[r.index()]
    }

    /// Write a register without touching the condition flags.
    #[inline]
    pub fn set(&mut self, r: Reg, value: u16) {
        self.gpr[r.index()] = value;
    }

    /// Write a register and recompute the condition flags from the new value.
    #[inline]
    pub fn write(&mut self, r: Reg, value: u16) {
        self.set(r, value);
        self.update_flags(r);
    }

    /// Recompute COND from the current contents of `r`.
    pub fn update_flags(&mut self, r: Reg) {
        self.cond = Flag::from_value(self.get(r));
    }

    /// Increment the program counter by 1, wrapping at the top of memory.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reg_from_field() {
        // ADD R1, R2, R3
        let word = 0b0001_001_010_0_00_011;
        assert_eq!(Reg::from_field(word, 9), Reg::new(1));
        assert_eq!(Reg::from_field(word, 6), Reg::new(2));
        assert_eq!(Reg::from_field(word, 0), Reg::new(3));
    }

    #[test]
    fn test_flag_from_value() {
        assert_eq!(Flag::from_value(0), Flag::Zero);
        assert_eq!(Flag::from_value(1), Flag::Positive);
        assert_eq!(Flag::from_value(0x7FFF), Flag::Positive);
        assert_eq!(Flag::from_value(0x8000), Flag::Negative);
        assert_eq!(Flag::from_value(0xFFFF), Flag::Negative);
    }

    #[test]
    fn test_write_updates_flags_set_does_not() {
        let mut regs = Registers::new();
        regs.write(Reg::new(3), 0xFFFE);
        assert_eq!(regs.cond, Flag::Negative);

        regs.set(Reg::new(4), 5);
        assert_eq!(regs.cond, Flag::Negative);
        assert_eq!(regs.get(Reg::new(4)), 5);
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 0x3000;

        let old = regs.advance_pc();
        assert_eq!(old, 0x3000);
        assert_eq!(regs.pc, 0x3001);

        regs.jump(0xFFFF);
        regs.advance_pc();
        assert_eq!(regs.pc, 0x0000);
    }

    proptest! {
        #[test]
        fn prop_exactly_one_flag_matches_sign(value in any::<u16>(), n in 0u8..8) {
            let mut regs = Registers::new();
            regs.write(Reg::new(n), value);

            let bits = regs.cond.bits();
            prop_assert_eq!(bits.count_ones(), 1);
            let expected = match (value as i16).signum() {
                -1 => Flag::Negative,
                0 => Flag::Zero,
                _ => Flag::Positive,
            };
            prop_assert_eq!(regs.cond, expected);
        }
    }
}
