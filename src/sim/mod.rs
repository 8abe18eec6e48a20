//! Clocked simulation of the breadboard computer.
//!
//! This module implements the modules a breadboard computer is built from:
//! - a two-phase clock with rising and falling edge clients
//! - 32-line data and control buses, shared by reference
//! - registers, a ripple counter, memory with an address register
//! - an adder/subtractor ALU
//!
//! Modules coordinate only through the buses and the clock's edges.

pub mod error;
pub mod bus;
pub mod clock;
pub mod wiring;
pub mod register;
pub mod counter;
pub mod memory;
pub mod alu;
pub mod board;

pub use error::SimError;
pub use bus::{Bus, SharedBus, BUS_LINES};
pub use clock::{Clock, ClockConfig, CycleHandle, CycleStatus, Edge};
pub use wiring::Wiring;
pub use register::{Register, RegisterConfig};
pub use counter::{Counter, CounterConfig};
pub use memory::{Memory, MemoryConfig};
pub use alu::{Alu, AluConfig};
pub use board::{BoardConfig, BoardSnapshot, Breadboard, ControlLine, LineMap};
