//! Operand field helpers shared by the loads, stores and control transfers.
//!
//! Every offset embedded in an instruction is a two's complement field of
//! 5, 6, 9 or 11 bits. Effective addresses are formed with wrapping 16-bit
//! arithmetic, so an offset that walks off either end of memory lands on the
//! other side instead of faulting.

/// Sign-extend the low `width` bits of `field` to a full 16-bit word.
///
/// Bits above `width` in the input are ignored. If bit `width - 1` is set the
/// result has every bit from `width` upward set as well.
#[inline]
pub fn sign_extend(field: u16, width: u32) -> u16 {
    debug_assert!(width > 0 && width < 16);
    let mask = (1u16 << width) - 1;
    let field = field & mask;
    if (field >> (width - 1)) & 1 == 1 {
        field | !mask
    } else {
        field
    }
}

/// Effective address for PC-relative modes (LD, LDI, LEA, ST, STI, BR, JSR).
///
/// `pc` is the already incremented program counter.
#[inline]
pub fn pc_relative(pc: u16, offset: u16) -> u16 {
    pc.wrapping_add(offset)
}

/// Effective address for base+offset modes (LDR, STR).
#[inline]
pub fn base_offset(base: u16, offset: u16) -> u16 {
    base.wrapping_add(offset)
}
