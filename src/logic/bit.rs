//! Single binary signal value.
//!
//! A bit is either low (0) or high (1). Every gate is evaluated through a
//! constant truth table rather than Rust's own boolean operators, the same
//! way a breadboard gets its logic from 74-series chips.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::logic::gates::{AND_TABLE, FULL_ADDER_TABLE, NAND_TABLE, NOR_TABLE, OR_TABLE, XOR_TABLE};

/// A single binary signal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bit {
    /// Low (0)
    Low = 0,
    /// High (1)
    High = 1,
}

impl Bit {
    /// Both values in ascending order.
    pub const ALL: [Bit; 2] = [Bit::Low, Bit::High];

    /// Create a bit from an integer, treating any non-zero value as high.
    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        if value == 0 { Bit::Low } else { Bit::High }
    }

    /// Extract bit `index` of `word`. `index` must be below 32.
    #[inline]
    pub const fn of(word: u32, index: usize) -> Self {
        Bit::from_u32((word >> index) & 1)
    }

    /// Convert to 0 or 1.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Bit::High)
    }

    #[inline]
    const fn idx(self) -> usize {
        self as usize
    }

    /// Inverter.
    #[inline]
    pub const fn not(self) -> Self {
        match self {
            Bit::Low => Bit::High,
            Bit::High => Bit::Low,
        }
    }

    #[inline]
    pub const fn and(self, other: Self) -> Self {
        AND_TABLE[self.idx()][other.idx()]
    }

    #[inline]
    pub const fn or(self, other: Self) -> Self {
        OR_TABLE[self.idx()][other.idx()]
    }

    #[inline]
    pub const fn nand(self, other: Self) -> Self {
        NAND_TABLE[self.idx()][other.idx()]
    }

    #[inline]
    pub const fn nor(self, other: Self) -> Self {
        NOR_TABLE[self.idx()][other.idx()]
    }

    #[inline]
    pub const fn xor(self, other: Self) -> Self {
        XOR_TABLE[self.idx()][other.idx()]
    }

    /// Full adder: adds `a`, `b` and `carry_in`, returns (sum, carry_out).
    ///
    /// Argument order follows the chip pinout used throughout the crate:
    /// carry first, then the two operands.
    #[inline]
    pub const fn full_add(carry_in: Self, a: Self, b: Self) -> (Self, Self) {
        FULL_ADDER_TABLE[carry_in.idx()][a.idx()][b.idx()]
    }
}

impl Default for Bit {
    fn default() -> Self {
        Bit::Low
    }
}

impl fmt::Debug for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u32())
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u32())
    }
}

impl std::ops::Not for Bit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Bit::not(self)
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value { Bit::High } else { Bit::Low }
    }
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        bit.is_high()
    }
}

impl From<Bit> for u32 {
    fn from(bit: Bit) -> Self {
        bit.to_u32()
    }
}
