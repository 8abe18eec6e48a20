//! Multi-bit arithmetic built from the full adder.
//!
//! Words are plain `u32` values; only the low `width` bits take part and
//! results are truncated to `width` bits. Every operation walks a
//! ripple-carry chain one bit at a time, least significant bit first.

use crate::logic::Bit;

/// Largest supported word width.
pub const MAX_WIDTH: usize = 32;

/// Mask with the low `width` bits set. Widths above 32 saturate.
#[inline]
pub const fn mask(width: usize) -> u32 {
    if width >= MAX_WIDTH {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Ripple-carry addition of `a`, `b` and `carry_in`, returning (sum, carry_out).
pub fn add_with_carry(a: u32, b: u32, carry_in: Bit, width: usize) -> (u32, Bit) {
    let width = width.min(MAX_WIDTH);
    let mut result = 0u32;
    let mut carry = carry_in;

    for i in 0..width {
        let (sum, carry_out) = Bit::full_add(carry, Bit::of(a, i), Bit::of(b, i));
        result |= sum.to_u32() << i;
        carry = carry_out;
    }

    (result, carry)
}

/// Add two words, returning (sum, carry_out).
#[inline]
pub fn add(a: u32, b: u32, width: usize) -> (u32, Bit) {
    add_with_carry(a, b, Bit::Low, width)
}

/// Add or subtract through one adder chain.
///
/// Each bit of `b` passes through an XOR with `subtract` before entering the
/// adder, and `subtract` also feeds the first carry-in, so `a - b` is
/// computed as `a + !b + 1`.
pub fn add_sub(a: u32, b: u32, subtract: Bit, width: usize) -> (u32, Bit) {
    let width = width.min(MAX_WIDTH);
    let mut result = 0u32;
    let mut carry = subtract;

    for i in 0..width {
        let conditioned = Bit::of(b, i).xor(subtract);
        let (sum, carry_out) = Bit::full_add(carry, Bit::of(a, i), conditioned);
        result |= sum.to_u32() << i;
        carry = carry_out;
    }

    (result, carry)
}

/// Subtract `b` from `a` (modulo 2^width), returning (difference, carry_out).
///
/// A carry-out of high means no borrow occurred.
#[inline]
pub fn subtract(a: u32, b: u32, width: usize) -> (u32, Bit) {
    add_sub(a, b, Bit::High, width)
}

/// Add one to `value` (modulo 2^width).
///
/// The constant one is presented on the `b` input of the least significant
/// stage only; the rest of the chain just propagates the carry.
pub fn increment(value: u32, width: usize) -> u32 {
    let width = width.min(MAX_WIDTH);
    let mut result = 0u32;
    let mut carry = Bit::Low;

    for i in 0..width {
        let one = Bit::from(i == 0);
        let (sum, carry_out) = Bit::full_add(carry, Bit::of(value, i), one);
        result |= sum.to_u32() << i;
        carry = carry_out;
    }

    result
}
