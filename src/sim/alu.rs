//! Adder/subtractor ALU.
//!
//! Two input registers (A and B, load only) feed a ripple-carry adder whose
//! result lands straight in the output register (drive only). The subtract
//! line passes every bit of B through an XOR and also feeds the first
//! carry-in, turning the adder into a twos-complement subtractor.
//!
//! The sum is recomputed on every rising edge, after the three registers
//! have handled their own lines. The final carry is discarded.

use log::debug;
use serde::{Serialize, Deserialize};
use crate::logic::{arith, Bit};
use crate::sim::register::checked_width;
use crate::sim::wiring::line_asserted;
use crate::sim::{Register, RegisterConfig, SimError, Wiring};

/// ALU settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AluConfig {
    /// Width of A, B and the output register.
    pub width: usize,
    pub a_load_line: Option<usize>,
    pub b_load_line: Option<usize>,
    pub out_drive_line: Option<usize>,
    /// Selects subtraction when high.
    pub subtract_line: Option<usize>,
}

impl Default for AluConfig {
    fn default() -> Self {
        Self {
            width: 8,
            a_load_line: Some(0),
            b_load_line: Some(1),
            out_drive_line: Some(3),
            subtract_line: Some(4),
        }
    }
}

/// The ALU and its three registers.
#[derive(Debug, Clone)]
pub struct Alu {
    a: Register,
    b: Register,
    output: Register,
    config: AluConfig,
}

impl Alu {
    /// Build A, B and the output register, then the adder, all subscribed
    /// to the clock's rising edge in that order.
    pub fn new(wiring: Wiring<'_>, config: AluConfig) -> Result<Self, SimError> {
        let mut wired = wiring.resolve()?;
        let width = checked_width(config.width)?;

        let mut a_config = RegisterConfig::new(width);
        a_config.load_line = config.a_load_line;
        let mut b_config = RegisterConfig::new(width);
        b_config.load_line = config.b_load_line;
        let mut out_config = RegisterConfig::new(width);
        out_config.drive_line = config.out_drive_line;

        let a = Register::new(wired.rewire(), a_config)?;
        let b = Register::new(wired.rewire(), b_config)?;
        let output = Register::new(wired.rewire(), out_config)?;

        let alu = Self {
            a: a.clone(),
            b: b.clone(),
            output: output.clone(),
            config: AluConfig { width, ..config },
        };

        let control_bus = wired.control_bus;
        wired.clock.add_rising_client(move || {
            let subtract = Bit::from(line_asserted(&control_bus, config.subtract_line));
            output.set_value(Self::compute(a.value(), b.value(), subtract, width));
            Ok(())
        });

        debug!("alu wired: {:?}", alu.config);
        Ok(alu)
    }

    /// The adder itself: `a + b` or `a - b` modulo 2^width.
    pub fn compute(a: u32, b: u32, subtract: Bit, width: usize) -> u32 {
        arith::add_sub(a, b, subtract, width).0
    }

    #[inline]
    pub fn a(&self) -> &Register {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &Register {
        &self.b
    }

    #[inline]
    pub fn output(&self) -> &Register {
        &self.output
    }

    /// Bit `index` of the output register.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Bit> {
        self.output.get(index)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.config.width
    }

    #[inline]
    pub fn config(&self) -> &AluConfig {
        &self.config
    }
}
