//! Gate truth tables.
//!
//! The tables are indexed `[a][b]` (and `[carry_in][a][b]` for the full
//! adder) with 0 = low and 1 = high.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::logic::Bit;

const L: Bit = Bit::Low;
const H: Bit = Bit::High;

pub const AND_TABLE: [[Bit; 2]; 2] = [[L, L], [L, H]];
pub const OR_TABLE: [[Bit; 2]; 2] = [[L, H], [H, H]];
pub const NAND_TABLE: [[Bit; 2]; 2] = [[H, H], [H, L]];
pub const NOR_TABLE: [[Bit; 2]; 2] = [[H, L], [L, L]];
pub const XOR_TABLE: [[Bit; 2]; 2] = [[L, H], [H, L]];

/// (sum, carry_out) for each (carry_in, a, b).
pub const FULL_ADDER_TABLE: [[[(Bit, Bit); 2]; 2]; 2] = [
    [[(L, L), (H, L)], [(H, L), (L, H)]],
    [[(H, L), (L, H)], [(L, H), (H, H)]],
];

/// The two-input gates available on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    And,
    Or,
    Nand,
    Nor,
    Xor,
}

impl Gate {
    pub const ALL: [Gate; 5] = [Gate::And, Gate::Or, Gate::Nand, Gate::Nor, Gate::Xor];

    /// Evaluate the gate.
    pub const fn eval(self, a: Bit, b: Bit) -> Bit {
        match self {
            Gate::And => a.and(b),
            Gate::Or => a.or(b),
            Gate::Nand => a.nand(b),
            Gate::Nor => a.nor(b),
            Gate::Xor => a.xor(b),
        }
    }

    /// All four rows as (a, b, output), in counting order.
    pub fn truth_table(self) -> [(Bit, Bit, Bit); 4] {
        let mut rows = [(L, L, L); 4];
        for (i, row) in rows.iter_mut().enumerate() {
            let a = Bit::of(i as u32, 1);
            let b = Bit::of(i as u32, 0);
            *row = (a, b, self.eval(a, b));
        }
        rows
    }

    pub const fn name(self) -> &'static str {
        match self {
            Gate::And => "AND",
            Gate::Or => "OR",
            Gate::Nand => "NAND",
            Gate::Nor => "NOR",
            Gate::Xor => "XOR",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full adder rows as (carry_in, a, b, sum, carry_out), in counting order.
pub fn full_adder_rows() -> [(Bit, Bit, Bit, Bit, Bit); 8] {
    let mut rows = [(L, L, L, L, L); 8];
    for (i, row) in rows.iter_mut().enumerate() {
        let cin = Bit::of(i as u32, 2);
        let a = Bit::of(i as u32, 1);
        let b = Bit::of(i as u32, 0);
        let (sum, cout) = Bit::full_add(cin, a, b);
        *row = (cin, a, b, sum, cout);
    }
    rows
}
