//! Connecting components to the clock and the two buses.
//!
//! Components never own the clock or the buses. A [`Wiring`] gathers the
//! references a component needs; the component's constructor checks that
//! all three are present before subscribing to the clock.

use crate::sim::{Clock, SharedBus, SimError};

/// References a component is wired to.
#[derive(Default)]
pub struct Wiring<'c> {
    clock: Option<&'c mut Clock>,
    data_bus: Option<SharedBus>,
    control_bus: Option<SharedBus>,
}

impl<'c> Wiring<'c> {
    /// Start with nothing connected.
    pub fn new() -> Self {
        Self {
            clock: None,
            data_bus: None,
            control_bus: None,
        }
    }

    /// Wiring with all three references connected.
    pub fn to(clock: &'c mut Clock, data_bus: &SharedBus, control_bus: &SharedBus) -> Self {
        Self::new().clock(clock).data_bus(data_bus).control_bus(control_bus)
    }

    pub fn clock(mut self, clock: &'c mut Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn data_bus(mut self, bus: &SharedBus) -> Self {
        self.data_bus = Some(SharedBus::clone(bus));
        self
    }

    pub fn control_bus(mut self, bus: &SharedBus) -> Self {
        self.control_bus = Some(SharedBus::clone(bus));
        self
    }

    /// Check every reference is present.
    pub(crate) fn resolve(self) -> Result<Wired<'c>, SimError> {
        Ok(Wired {
            clock: self.clock.ok_or(SimError::MissingClock)?,
            data_bus: self.data_bus.ok_or(SimError::MissingDataBus)?,
            control_bus: self.control_bus.ok_or(SimError::MissingControlBus)?,
        })
    }
}

/// A complete set of references.
pub(crate) struct Wired<'c> {
    pub clock: &'c mut Clock,
    pub data_bus: SharedBus,
    pub control_bus: SharedBus,
}

impl<'c> Wired<'c> {
    /// Wiring for a sub-component sharing the same clock and buses.
    pub fn rewire(&mut self) -> Wiring<'_> {
        Wiring::to(&mut *self.clock, &self.data_bus, &self.control_bus)
    }
}

/// True if `line` is configured and currently high on `bus`.
#[inline]
pub(crate) fn line_asserted(bus: &SharedBus, line: Option<usize>) -> bool {
    line.map_or(false, |l| bus.borrow().is_asserted(l))
}
