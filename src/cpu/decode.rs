//! Instruction decoder for the LC-3.
//!
//! Bits [15:12] of every instruction word select one of sixteen opcodes.
//! The remaining twelve bits hold opcode-specific operand fields which are
//! pulled apart here, so the executor only ever sees typed operands with
//! offsets already sign-extended.

use crate::cpu::addressing::sign_extend;
use crate::cpu::registers::Reg;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The top nibble of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Opcode {
    Br = 0x0,
    Add = 0x1,
    Ld = 0x2,
    St = 0x3,
    Jsr = 0x4,
    And = 0x5,
    Ldr = 0x6,
    Str = 0x7,
    Rti = 0x8,
    Not = 0x9,
    Ldi = 0xA,
    Sti = 0xB,
    Jmp = 0xC,
    Res = 0xD,
    Lea = 0xE,
    Trap = 0xF,
}

/// Second operand of ADD and AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Bit 5 clear: SR2 in bits [2:0]
    Register(Reg),
    /// Bit 5 set: imm5, sign-extended
    Immediate(u16),
}

/// Where JSR transfers control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsrTarget {
    /// Bit 11 set (JSR): PC + sign-extended PCoffset11
    Offset(u16),
    /// Bit 11 clear (JSRR): contents of a base register
    Register(Reg),
}

/// Decoded LC-3 instruction.
///
/// All `offset` and immediate fields hold the sign-extended 16-bit value and
/// are combined with the PC or a base register using wrapping addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Operate ====================

    /// DR := SR1 + operand
    Add { dr: Reg, sr1: Reg, operand: Operand },

    /// DR := SR1 & operand
    And { dr: Reg, sr1: Reg, operand: Operand },

    /// DR := !SR
    Not { dr: Reg, sr: Reg },

    // ==================== Data Movement ====================

    /// DR := mem[PC + offset9]
    Ld { dr: Reg, offset: u16 },

    /// DR := mem[mem[PC + offset9]]
    Ldi { dr: Reg, offset: u16 },

    /// DR := mem[BaseR + offset6]
    Ldr { dr: Reg, base: Reg, offset: u16 },

    /// DR := PC + offset9
    Lea { dr: Reg, offset: u16 },

    /// mem[PC + offset9] := SR
    St { sr: Reg, offset: u16 },

    /// mem[mem[PC + offset9]] := SR
    Sti { sr: Reg, offset: u16 },

    /// mem[BaseR + offset6] := SR
    Str { sr: Reg, base: Reg, offset: u16 },

    // ==================== Control ====================

    /// If COND & mask != 0 then PC := PC + offset9
    Br { mask: u16, offset: u16 },

    /// PC := BaseR (RET is JMP R7)
    Jmp { base: Reg },

    /// R7 := PC, then PC := target
    Jsr { target: JsrTarget },

    /// Call the trap service routine for an 8-bit vector
    Trap { vector: u8 },

    // ==================== Reserved ====================

    /// Return from interrupt. No privilege model here, so a no-op.
    Rti,

    /// Reserved opcode 0xD. No-op.
    Res,
}

/// Decode a 16-bit instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::try_from((word >> 12) as u8)
        .map_err(|e| DecodeError::InvalidOpcode(e.number))?;

    let dr = Reg::from_field(word, 9);
    let sr1 = Reg::from_field(word, 6);
    let offset6 = sign_extend(word, 6);
    let offset9 = sign_extend(word, 9);

    let instruction = match opcode {
        Opcode::Br => Instruction::Br { mask: (word >> 9) & 0x7, offset: offset9 },
        Opcode::Add => Instruction::Add { dr, sr1, operand: operand(word) },
        Opcode::And => Instruction::And { dr, sr1, operand: operand(word) },
        Opcode::Not => Instruction::Not { dr, sr: sr1 },
        Opcode::Ld => Instruction::Ld { dr, offset: offset9 },
        Opcode::Ldi => Instruction::Ldi { dr, offset: offset9 },
        Opcode::Ldr => Instruction::Ldr { dr, base: sr1, offset: offset6 },
        Opcode::Lea => Instruction::Lea { dr, offset: offset9 },
        Opcode::St => Instruction::St { sr: dr, offset: offset9 },
        Opcode::Sti => Instruction::Sti { sr: dr, offset: offset9 },
        Opcode::Str => Instruction::Str { sr: dr, base: sr1, offset: offset6 },
        Opcode::Jmp => Instruction::Jmp { base: sr1 },
        Opcode::Jsr => {
            let target = if (word >> 11) & 1 == 1 {
                JsrTarget::Offset(sign_extend(word, 11))
            } else {
                JsrTarget::Register(sr1)
            };
            Instruction::Jsr { target }
        }
        Opcode::Trap => Instruction::Trap { vector: (word & 0xFF) as u8 },
        Opcode::Rti => Instruction::Rti,
        Opcode::Res => Instruction::Res,
    };

    Ok(instruction)
}

fn operand(word: u16) -> Operand {
    if (word >> 5) & 1 == 1 {
        Operand::Immediate(sign_extend(word, 5))
    } else {
        Operand::Register(Reg::from_field(word, 0))
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#x}")]
    InvalidOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_add_register_and_immediate() {
        // ADD R1, R1, R0
        assert_eq!(
            decode(0x1240).unwrap(),
            Instruction::Add { dr: Reg::new(1), sr1: Reg::new(1), operand: Operand::Register(Reg::new(0)) }
        );
        // ADD R0, R1, #0
        assert_eq!(
            decode(0x1060).unwrap(),
            Instruction::Add { dr: Reg::new(0), sr1: Reg::new(1), operand: Operand::Immediate(0) }
        );
        // ADD R2, R2, #-1
        assert_eq!(
            decode(0x14BF).unwrap(),
            Instruction::Add { dr: Reg::new(2), sr1: Reg::new(2), operand: Operand::Immediate(0xFFFF) }
        );
    }

    #[test]
    fn test_decode_branch_mask_and_offset() {
        // BRz #-3
        assert_eq!(
            decode(0x05FD).unwrap(),
            Instruction::Br { mask: 0b010, offset: 0xFFFD }
        );
        // BRnzp #5
        assert_eq!(
            decode(0x0E05).unwrap(),
            Instruction::Br { mask: 0b111, offset: 5 }
        );
    }

    #[test]
    fn test_decode_jsr_forms() {
        // JSR #-1
        assert_eq!(
            decode(0x4FFF).unwrap(),
            Instruction::Jsr { target: JsrTarget::Offset(0xFFFF) }
        );
        // JSRR R3
        assert_eq!(
            decode(0x40C0).unwrap(),
            Instruction::Jsr { target: JsrTarget::Register(Reg::new(3)) }
        );
    }

    #[test]
    fn test_decode_base_offset_uses_six_bits() {
        // LDR R4, R2, #-5
        assert_eq!(
            decode(0x68BB).unwrap(),
            Instruction::Ldr { dr: Reg::new(4), base: Reg::new(2), offset: 0xFFFB }
        );
        // STR R1, R6, #31
        assert_eq!(
            decode(0x739F).unwrap(),
            Instruction::Str { sr: Reg::new(1), base: Reg::new(6), offset: 31 }
        );
    }

    #[test]
    fn test_decode_store_indirect_uses_nine_bits() {
        // STI R0, #0x80 -- bit 7 is outside a 6-bit field
        assert_eq!(
            decode(0xB080).unwrap(),
            Instruction::Sti { sr: Reg::new(0), offset: 0x0080 }
        );
    }

    #[test]
    fn test_decode_trap_and_reserved() {
        assert_eq!(decode(0xF025).unwrap(), Instruction::Trap { vector: 0x25 });
        assert_eq!(decode(0xF0FF).unwrap(), Instruction::Trap { vector: 0xFF });
        assert_eq!(decode(0x8000).unwrap(), Instruction::Rti);
        assert_eq!(decode(0xD123).unwrap(), Instruction::Res);
    }

    #[test]
    fn test_every_opcode_decodes() {
        for op in 0u16..16 {
            assert!(decode(op << 12).is_ok(), "opcode {:#x} has no handler", op);
        }
    }

    #[test]
    fn test_opcode_out_of_range() {
        let err = Opcode::try_from(0x10u8).unwrap_err();
        assert_eq!(err.number, 0x10);
    }
}
