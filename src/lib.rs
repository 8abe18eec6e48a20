//! # Breadboard Simulator
//!
//! A bit-level simulator of a breadboard computer built from discrete
//! logic: a two-phase clock, a data bus and a control bus, clocked
//! registers, a ripple counter, addressable memory and an adder/subtractor
//! ALU, all computed through gate truth tables.
//!
//! Flip control lines, step the clock and watch values move between
//! modules exactly as they would on a real TTL breadboard.

pub mod logic;
pub mod sim;
pub mod script;

// Re-export commonly used types
pub use logic::{Bit, Gate};
pub use sim::{
    Alu, BoardConfig, BoardSnapshot, Breadboard, Bus, Clock, ClockConfig, ControlLine, Counter,
    Memory, Register, SharedBus, SimError, Wiring,
};
pub use script::{load_script, parse, run, RunReport, Script, ScriptError};
