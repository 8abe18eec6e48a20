//! Control-word scripts.
//!
//! A script drives the breadboard the way a person at the front panel
//! would: put values on the bus, flip control lines, clock, and check what
//! ended up where.

pub mod parser;
pub mod runner;

pub use parser::{load_script, parse, Command, LineRef, Script, Statement, Target};
pub use runner::{run, RunReport, TraceEntry};

use thiserror::Error;
use crate::sim::SimError;

/// Errors that can occur while loading or running a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: expected {target} = {expected}, found {}", display_actual(.actual))]
    Expectation {
        line: usize,
        target: Target,
        expected: u32,
        actual: Option<u32>,
    },

    #[error("line {line}: {source}")]
    Sim {
        line: usize,
        #[source]
        source: SimError,
    },
}

fn display_actual(actual: &Option<u32>) -> String {
    match actual {
        Some(value) => value.to_string(),
        None => "nothing".to_string(),
    }
}
