//! Errors raised while wiring or clocking the board.

use thiserror::Error;

/// Errors that can occur while building or running the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("clock must be specified")]
    MissingClock,

    #[error("data bus must be specified")]
    MissingDataBus,

    #[error("control bus must be specified")]
    MissingControlBus,

    #[error("invalid width {0} (must be 1-32 bits)")]
    InvalidWidth(usize),

    #[error("memory must have at least one cell")]
    InvalidSize,

    #[error("memory address {address} out of range (0-{})", .size.saturating_sub(1))]
    AddressOutOfRange { address: usize, size: usize },

    #[error("program of {len} cells does not fit at address {start} (memory size {size})")]
    ProgramTooLarge { start: usize, len: usize, size: usize },
}
