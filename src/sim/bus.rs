//! Passive shared bus.
//!
//! A bus is a set of 32 lines holding their level until something sets
//! them. Both the data bus and the control bus are instances of [`Bus`];
//! components hold a [`SharedBus`] handle rather than owning the bus.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use serde::{Serialize, Deserialize};
use crate::logic::Bit;

/// Number of lines on a bus.
pub const BUS_LINES: usize = 32;

/// Handle to a bus shared by every component wired to it.
pub type SharedBus = Rc<RefCell<Bus>>;

/// A 32-line bus.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    value: u32,
}

impl Bus {
    /// Create a bus with every line low.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Create a bus wrapped for sharing.
    pub fn shared() -> SharedBus {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Level of line `index`, or `None` if the bus has no such line.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Bit> {
        (index < BUS_LINES).then(|| Bit::of(self.value, index))
    }

    /// True if line `index` exists and is high.
    #[inline]
    pub fn is_asserted(&self, index: usize) -> bool {
        self.get(index).map_or(false, Bit::is_high)
    }

    /// Drive line `index` to `value`, or toggle it when `value` is `None`.
    ///
    /// Lines outside the bus are ignored.
    pub fn set(&mut self, index: usize, value: Option<Bit>) {
        let Some(current) = self.get(index) else {
            return;
        };
        let level = value.unwrap_or(!current);
        match level {
            Bit::High => self.value |= 1u32 << index,
            Bit::Low => self.value &= !(1u32 << index),
        }
    }

    /// Flip line `index`, like pressing a latching push button.
    #[inline]
    pub fn toggle(&mut self, index: usize) {
        self.set(index, None);
    }

    /// Whole-bus value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Replace the whole-bus value.
    #[inline]
    pub fn set_value(&mut self, value: u32) {
        self.value = value;
    }

    /// Drop every line low.
    pub fn clear(&mut self) {
        self.value = 0;
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bus({:#010x})", self.value)
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_range() {
        let bus = Bus::new();
        assert_eq!(bus.get(31), Some(Bit::Low));
        assert_eq!(bus.get(32), None);
        assert_eq!(bus.get(usize::MAX), None);
    }

    #[test]
    fn test_set_and_clear_line() {
        let mut bus = Bus::new();
        bus.set(3, Some(Bit::High));
        assert_eq!(bus.value(), 0b1000);
        assert_eq!(bus.get(3), Some(Bit::High));

        bus.set(3, Some(Bit::Low));
        assert_eq!(bus.value(), 0);
    }

    #[test]
    fn test_set_without_value_toggles() {
        let mut bus = Bus::new();
        bus.set(0, None);
        assert!(bus.is_asserted(0));
        bus.toggle(0);
        assert!(!bus.is_asserted(0));
    }

    #[test]
    fn test_high_line_31() {
        let mut bus = Bus::new();
        bus.set(31, Some(Bit::High));
        assert_eq!(bus.value(), 0x8000_0000);
    }

    #[test]
    fn test_set_out_of_range_is_ignored() {
        let mut bus = Bus::new();
        bus.set_value(0x55);
        bus.set(40, Some(Bit::High));
        bus.toggle(32);
        assert_eq!(bus.value(), 0x55);
    }

    #[test]
    fn test_shared_handles_see_same_value() {
        let bus = Bus::shared();
        let other = Rc::clone(&bus);
        bus.borrow_mut().set_value(0xAB);
        assert_eq!(other.borrow().value(), 0xAB);
        assert_eq!(format!("{}", other.borrow()), "0xab");
    }
}
