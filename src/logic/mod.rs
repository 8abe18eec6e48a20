//! Binary logic primitives.
//!
//! This module provides the gate library the rest of the board is built on:
//! - [`Bit`] - a single signal with AND/OR/NAND/NOR/XOR and the full adder
//! - [`gates`] - the constant truth tables behind every gate
//! - [`arith`] - ripple-carry add, subtract and increment over `u32` words

mod bit;
pub mod gates;
pub mod arith;

pub use bit::Bit;
pub use gates::Gate;
pub use arith::{add, add_sub, subtract, increment, mask};
