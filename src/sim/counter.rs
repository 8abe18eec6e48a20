//! Ripple counter.
//!
//! A counter is a register with a third control line. On the rising edge
//! it checks, in order:
//! 1. load: copy the data bus in (masked)
//! 2. increment: add one through the full-adder chain (masked)
//! 3. drive: copy the count onto the data bus
//!
//! Each step sees the result of the one before it, so load + increment on
//! the same edge leaves the loaded value plus one.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use log::debug;
use serde::{Serialize, Deserialize};
use crate::logic::{arith, Bit};
use crate::sim::register::checked_width;
use crate::sim::wiring::line_asserted;
use crate::sim::{SimError, Wiring};

/// Counter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub width: usize,
    pub load_line: Option<usize>,
    pub increment_line: Option<usize>,
    pub drive_line: Option<usize>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            width: 8,
            load_line: Some(0),
            drive_line: Some(1),
            increment_line: Some(2),
        }
    }
}

/// A clocked ripple counter. Clones share the same count.
#[derive(Clone)]
pub struct Counter {
    count: Rc<Cell<u32>>,
    width: usize,
    mask: u32,
    config: CounterConfig,
}

impl Counter {
    /// Build a counter and subscribe it to the clock's rising edge.
    pub fn new(wiring: Wiring<'_>, config: CounterConfig) -> Result<Self, SimError> {
        let wired = wiring.resolve()?;
        let width = checked_width(config.width)?;
        let counter = Self {
            count: Rc::new(Cell::new(0)),
            width,
            mask: arith::mask(width),
            config: CounterConfig { width, ..config },
        };

        let count = Rc::clone(&counter.count);
        let mask = counter.mask;
        let data_bus = wired.data_bus;
        let control_bus = wired.control_bus;
        wired.clock.add_rising_client(move || {
            if line_asserted(&control_bus, config.load_line) {
                count.set(data_bus.borrow().value() & mask);
            }
            if line_asserted(&control_bus, config.increment_line) {
                count.set(arith::increment(count.get(), width));
            }
            if line_asserted(&control_bus, config.drive_line) {
                data_bus.borrow_mut().set_value(count.get());
            }
            Ok(())
        });

        debug!("counter wired: {:?}", counter.config);
        Ok(counter)
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.count.get()
    }

    /// Replace the count, truncated to the counter width.
    #[inline]
    pub fn set_value(&self, value: u32) {
        self.count.set(value & self.mask);
    }

    /// Bit `index` of the count, or `None` past the counter width.
    pub fn get(&self, index: usize) -> Option<Bit> {
        (index < self.width).then(|| Bit::of(self.value(), index))
    }

    /// Set bit `index`, or toggle it when `value` is `None`.
    pub fn set(&self, index: usize, value: Option<Bit>) {
        let Some(current) = self.get(index) else {
            return;
        };
        let bit = 1u32 << index;
        let count = match value.unwrap_or(!current) {
            Bit::High => self.value() | bit,
            Bit::Low => self.value() & !bit,
        };
        self.set_value(count);
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("count", &self.value())
            .field("width", &self.width)
            .finish()
    }
}
