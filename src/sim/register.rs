//! Clocked register.
//!
//! On every rising edge a register checks two control lines:
//! - the drive line: copy the stored value onto the data bus (unmasked)
//! - the load line: copy the data bus, masked to the register width, in
//!
//! The drive line is checked and acted on first. Either line may be left
//! unconnected.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use log::debug;
use serde::{Serialize, Deserialize};
use crate::logic::{arith, Bit};
use crate::sim::wiring::line_asserted;
use crate::sim::{SimError, Wiring};

/// Register settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Bits stored (1-32, larger values are clamped to 32).
    pub width: usize,
    /// Control line that loads the register from the data bus.
    pub load_line: Option<usize>,
    /// Control line that drives the register onto the data bus.
    pub drive_line: Option<usize>,
}

impl RegisterConfig {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            load_line: None,
            drive_line: None,
        }
    }

    pub fn load_line(mut self, line: usize) -> Self {
        self.load_line = Some(line);
        self
    }

    pub fn drive_line(mut self, line: usize) -> Self {
        self.drive_line = Some(line);
        self
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Validate a configured width, clamping it to 32 bits.
pub(crate) fn checked_width(width: usize) -> Result<usize, SimError> {
    if width == 0 {
        return Err(SimError::InvalidWidth(width));
    }
    Ok(width.min(arith::MAX_WIDTH))
}

/// A clocked register. Clones share the same storage.
#[derive(Clone)]
pub struct Register {
    value: Rc<Cell<u32>>,
    width: usize,
    mask: u32,
    load_line: Option<usize>,
    drive_line: Option<usize>,
}

impl Register {
    /// Build a register and subscribe it to the clock's rising edge.
    pub fn new(wiring: Wiring<'_>, config: RegisterConfig) -> Result<Self, SimError> {
        let wired = wiring.resolve()?;
        let width = checked_width(config.width)?;
        let register = Self {
            value: Rc::new(Cell::new(0)),
            width,
            mask: arith::mask(width),
            load_line: config.load_line,
            drive_line: config.drive_line,
        };

        let value = Rc::clone(&register.value);
        let mask = register.mask;
        let (load_line, drive_line) = (config.load_line, config.drive_line);
        let data_bus = wired.data_bus;
        let control_bus = wired.control_bus;
        wired.clock.add_rising_client(move || {
            if line_asserted(&control_bus, drive_line) {
                data_bus.borrow_mut().set_value(value.get());
            }
            if line_asserted(&control_bus, load_line) {
                value.set(data_bus.borrow().value() & mask);
            }
            Ok(())
        });

        debug!(
            "register wired: {} bits, load line {:?}, drive line {:?}",
            width, load_line, drive_line
        );
        Ok(register)
    }

    /// Stored value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.value.get()
    }

    /// Replace the stored value, truncated to the register width.
    #[inline]
    pub fn set_value(&self, value: u32) {
        self.value.set(value & self.mask);
    }

    /// Bit `index` of the stored value, or `None` past the register width.
    pub fn get(&self, index: usize) -> Option<Bit> {
        (index < self.width).then(|| Bit::of(self.value(), index))
    }

    /// Set bit `index`, or toggle it when `value` is `None`.
    ///
    /// Indices past the register width are ignored.
    pub fn set(&self, index: usize, value: Option<Bit>) {
        let Some(current) = self.get(index) else {
            return;
        };
        let bit = 1u32 << index;
        match value.unwrap_or(!current) {
            Bit::High => self.value.set(self.value() | bit),
            Bit::Low => self.value.set(self.value() & !bit),
        }
    }

    #[inline]
    pub fn toggle(&self, index: usize) {
        self.set(index, None);
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
    pub fn load_line(&self) -> Option<usize> {
        self.load_line
    }

    #[inline]
    pub fn drive_line(&self) -> Option<usize> {
        self.drive_line
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("value", &format_args!("{:#x}", self.value()))
            .field("width", &self.width)
            .field("load_line", &self.load_line)
            .field("drive_line", &self.drive_line)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Bus, Clock, SharedBus};

    const LOAD: usize = 1;
    const DRIVE: usize = 2;

    fn board(width: usize) -> (Clock, SharedBus, SharedBus, Register) {
        let mut clock = Clock::manual(100);
        let data = Bus::shared();
        let control = Bus::shared();
        let config = RegisterConfig::new(width).load_line(LOAD).drive_line(DRIVE);
        let reg = Register::new(Wiring::to(&mut clock, &data, &control), config).unwrap();
        (clock, data, control, reg)
    }

    #[test]
    fn test_missing_references() {
        let mut clock = Clock::default();
        let bus = Bus::shared();
        let err = Register::new(Wiring::new().clock(&mut clock).data_bus(&bus), RegisterConfig::default());
        assert_eq!(err.err(), Some(SimError::MissingControlBus));

        let err = Register::new(Wiring::new().data_bus(&bus).control_bus(&bus), RegisterConfig::default());
        assert_eq!(err.err(), Some(SimError::MissingClock));
    }

    #[test]
    fn test_zero_width_rejected_and_wide_clamped() {
        let mut clock = Clock::default();
        let bus = Bus::shared();
        let err = Register::new(Wiring::to(&mut clock, &bus, &bus), RegisterConfig::new(0));
        assert_eq!(err.err(), Some(SimError::InvalidWidth(0)));

        let wide = Register::new(Wiring::to(&mut clock, &bus, &bus), RegisterConfig::new(64)).unwrap();
        assert_eq!(wide.width(), 32);
        assert_eq!(wide.mask(), u32::MAX);
    }

    #[test]
    fn test_load_masks_to_width() {
        let (mut clock, data, control, reg) = board(4);
        data.borrow_mut().set_value(0xAB);
        control.borrow_mut().set(LOAD, Some(Bit::High));

        clock.step().unwrap();
        assert_eq!(reg.value(), 0xB);
    }

    #[test]
    fn test_drive_is_unmasked_copy() {
        let (mut clock, data, control, reg) = board(8);
        data.borrow_mut().set_value(0xFFFF_0000);
        reg.set_value(0x5A);
        control.borrow_mut().set(DRIVE, Some(Bit::High));

        clock.step().unwrap();
        assert_eq!(data.borrow().value(), 0x5A);
    }

    #[test]
    fn test_idle_lines_change_nothing() {
        let (mut clock, data, _control, reg) = board(8);
        data.borrow_mut().set_value(0x42);
        reg.set_value(0x17);

        clock.step().unwrap();
        clock.step().unwrap();
        assert_eq!(reg.value(), 0x17);
        assert_eq!(data.borrow().value(), 0x42);
    }

    #[test]
    fn test_falling_edge_does_not_commit() {
        let (mut clock, data, control, reg) = board(8);
        clock.step().unwrap();
        data.borrow_mut().set_value(0x33);
        control.borrow_mut().set(LOAD, Some(Bit::High));

        clock.step().unwrap();
        assert_eq!(reg.value(), 0);
    }

    #[test]
    fn test_drive_then_load_on_same_edge() {
        let (mut clock, data, control, reg) = board(8);
        data.borrow_mut().set_value(0x99);
        reg.set_value(0x11);
        control.borrow_mut().set(LOAD, Some(Bit::High));
        control.borrow_mut().set(DRIVE, Some(Bit::High));

        clock.step().unwrap();
        assert_eq!(data.borrow().value(), 0x11);
        assert_eq!(reg.value(), 0x11);
    }

    #[test]
    fn test_bit_access() {
        let (_clock, _data, _control, reg) = board(4);
        reg.set(0, Some(Bit::High));
        reg.set(3, None);
        assert_eq!(reg.value(), 0b1001);
        assert_eq!(reg.get(3), Some(Bit::High));
        assert_eq!(reg.get(4), None);

        reg.set(7, Some(Bit::High));
        assert_eq!(reg.value(), 0b1001);

        reg.toggle(0);
        assert_eq!(reg.get(0), Some(Bit::Low));
    }

    #[test]
    fn test_clones_share_storage() {
        let (_clock, _data, _control, reg) = board(8);
        let view = reg.clone();
        reg.set_value(0x1FF);
        assert_eq!(view.value(), 0xFF);
    }
}
