//! Addressable memory.
//!
//! A bank of `size` cells of `width` bits, fronted by a memory address
//! register (MAR) that loads from the data bus. On the rising edge, after
//! the MAR has had its turn:
//! - write line: the data bus, masked, is stored in the addressed cell
//! - read line: the addressed cell is driven onto the data bus
//!
//! Write is applied before read, so asserting both on one edge drives the
//! value that was just written.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use log::debug;
use serde::{Serialize, Deserialize};
use crate::logic::{arith, Bit};
use crate::sim::register::checked_width;
use crate::sim::wiring::line_asserted;
use crate::sim::{Register, RegisterConfig, SimError, Wiring};

/// Memory settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Bits per cell, also the width of the address register.
    pub width: usize,
    /// Number of cells.
    pub size: usize,
    /// Control line that loads the address register from the data bus.
    pub address_load_line: Option<usize>,
    /// Control line that drives the addressed cell onto the data bus.
    pub read_line: Option<usize>,
    /// Control line that stores the data bus into the addressed cell.
    pub write_line: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            width: 8,
            size: 256,
            address_load_line: Some(0),
            write_line: Some(1),
            read_line: Some(2),
        }
    }
}

/// Clocked memory bank. Clones share the same cells.
#[derive(Clone)]
pub struct Memory {
    cells: Rc<RefCell<Vec<u32>>>,
    address: Register,
    width: usize,
    mask: u32,
    config: MemoryConfig,
}

impl Memory {
    /// Build the address register and the bank, both subscribed to the
    /// clock's rising edge (address register first).
    pub fn new(wiring: Wiring<'_>, config: MemoryConfig) -> Result<Self, SimError> {
        let mut wired = wiring.resolve()?;
        let width = checked_width(config.width)?;
        if config.size == 0 {
            return Err(SimError::InvalidSize);
        }

        let mut mar_config = RegisterConfig::new(width);
        mar_config.load_line = config.address_load_line;
        let address = Register::new(wired.rewire(), mar_config)?;

        let memory = Self {
            cells: Rc::new(RefCell::new(vec![0; config.size])),
            address: address.clone(),
            width,
            mask: arith::mask(width),
            config: MemoryConfig { width, ..config },
        };

        let cells = Rc::clone(&memory.cells);
        let mask = memory.mask;
        let size = config.size;
        let data_bus = wired.data_bus;
        let control_bus = wired.control_bus;
        wired.clock.add_rising_client(move || {
            let write = line_asserted(&control_bus, config.write_line);
            let read = line_asserted(&control_bus, config.read_line);
            if !write && !read {
                return Ok(());
            }

            let addr = address.value() as usize;
            if addr >= size {
                return Err(SimError::AddressOutOfRange { address: addr, size });
            }
            if write {
                cells.borrow_mut()[addr] = data_bus.borrow().value() & mask;
            }
            if read {
                let cell = cells.borrow()[addr];
                data_bus.borrow_mut().set_value(cell & mask);
            }
            Ok(())
        });

        debug!("memory wired: {:?}", memory.config);
        Ok(memory)
    }

    /// The memory address register.
    #[inline]
    pub fn address_register(&self) -> &Register {
        &self.address
    }

    /// Current address held by the MAR.
    #[inline]
    pub fn address(&self) -> usize {
        self.address.value() as usize
    }

    /// Value of cell `addr`, if it exists.
    pub fn cell(&self, addr: usize) -> Option<u32> {
        self.cells.borrow().get(addr).copied()
    }

    /// Value of the currently addressed cell, if the address is in range.
    pub fn current(&self) -> Option<u32> {
        self.cell(self.address())
    }

    /// Bit `index` of the addressed cell, or `None` when either the bit or
    /// the address is out of range.
    pub fn get(&self, index: usize) -> Option<Bit> {
        if index >= self.width {
            return None;
        }
        self.current().map(|cell| Bit::of(cell, index))
    }

    /// Set bit `index` of the addressed cell, or toggle it when `value` is
    /// `None`. Out-of-range bits or addresses are ignored.
    pub fn set(&self, index: usize, value: Option<Bit>) {
        let Some(current) = self.get(index) else {
            return;
        };
        let addr = self.address();
        let bit = 1u32 << index;
        let mut cells = self.cells.borrow_mut();
        match value.unwrap_or(!current) {
            Bit::High => cells[addr] |= bit,
            Bit::Low => cells[addr] &= !bit,
        }
    }

    /// Store `value` (masked) into cell `addr` without clocking.
    pub fn poke(&self, addr: usize, value: u32) -> Result<(), SimError> {
        let mut cells = self.cells.borrow_mut();
        let size = cells.len();
        let cell = cells
            .get_mut(addr)
            .ok_or(SimError::AddressOutOfRange { address: addr, size })?;
        *cell = value & self.mask;
        Ok(())
    }

    /// Load a block of values starting at `start`.
    pub fn load(&self, start: usize, values: &[u32]) -> Result<(), SimError> {
        let size = self.size();
        if start.checked_add(values.len()).map_or(true, |end| end > size) {
            return Err(SimError::ProgramTooLarge { start, len: values.len(), size });
        }

        let mut cells = self.cells.borrow_mut();
        for (cell, &value) in cells[start..].iter_mut().zip(values) {
            *cell = value & self.mask;
        }
        Ok(())
    }

    /// Cells `start..start + count` that exist, as (address, value).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u32)> {
        let cells = self.cells.borrow();
        let end = start.saturating_add(count).min(cells.len());
        (start.min(end)..end).map(|i| (i, cells[i])).collect()
    }

    /// Zero every cell.
    pub fn clear(&self) {
        self.cells.borrow_mut().iter_mut().for_each(|cell| *cell = 0);
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.size
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero = self.cells.borrow().iter().filter(|&&c| c != 0).count();
        f.debug_struct("Memory")
            .field("address", &self.address())
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Bus, Clock, SharedBus};

    const MAI: usize = 0;
    const WRITE: usize = 1;
    const READ: usize = 2;

    fn board(size: usize) -> (Clock, SharedBus, SharedBus, Memory) {
        let mut clock = Clock::manual(100);
        let data = Bus::shared();
        let control = Bus::shared();
        let config = MemoryConfig { size, ..MemoryConfig::default() };
        let memory = Memory::new(Wiring::to(&mut clock, &data, &control), config).unwrap();
        (clock, data, control, memory)
    }

    /// Assert exactly `lines` and clock one full cycle.
    fn clock_with(clock: &mut Clock, control: &SharedBus, lines: &[usize]) {
        {
            let mut bus = control.borrow_mut();
            bus.clear();
            for &line in lines {
                bus.set(line, Some(Bit::High));
            }
        }
        clock.step().unwrap();
        clock.step().unwrap();
    }

    #[test]
    fn test_write_then_read_back() {
        let (mut clock, data, control, memory) = board(16);
        data.borrow_mut().set_value(5);
        clock_with(&mut clock, &control, &[MAI]);
        assert_eq!(memory.address(), 5);

        data.borrow_mut().set_value(0x1A7);
        clock_with(&mut clock, &control, &[WRITE]);
        assert_eq!(memory.cell(5), Some(0xA7));

        data.borrow_mut().set_value(0);
        clock_with(&mut clock, &control, &[READ]);
        assert_eq!(data.borrow().value(), 0xA7);
    }

    #[test]
    fn test_read_after_write_same_edge() {
        let (mut clock, data, control, memory) = board(16);
        memory.poke(0, 0x11).unwrap();
        data.borrow_mut().set_value(0x42);
        clock_with(&mut clock, &control, &[WRITE, READ]);

        assert_eq!(memory.cell(0), Some(0x42));
        assert_eq!(data.borrow().value(), 0x42);
    }

    #[test]
    fn test_address_latched_before_access_on_same_edge() {
        let (mut clock, data, control, memory) = board(16);
        memory.poke(3, 0x77).unwrap();
        data.borrow_mut().set_value(3);
        clock_with(&mut clock, &control, &[MAI, READ]);
        assert_eq!(data.borrow().value(), 0x77);
    }

    #[test]
    fn test_address_out_of_range_is_fatal() {
        let (mut clock, data, control, memory) = board(4);
        data.borrow_mut().set_value(9);
        clock_with(&mut clock, &control, &[MAI]);
        assert_eq!(memory.address(), 9);
        assert_eq!(memory.get(0), None);

        control.borrow_mut().set(READ, Some(Bit::High));
        assert_eq!(
            clock.step(),
            Err(SimError::AddressOutOfRange { address: 9, size: 4 })
        );
    }

    #[test]
    fn test_bit_access_on_addressed_cell() {
        let (_clock, _data, _control, memory) = board(4);
        memory.poke(0, 0b0101).unwrap();
        assert_eq!(memory.get(0), Some(Bit::High));
        assert_eq!(memory.get(1), Some(Bit::Low));
        assert_eq!(memory.get(8), None);

        memory.set(1, None);
        assert_eq!(memory.cell(0), Some(0b0111));
    }

    #[test]
    fn test_load_and_dump() {
        let (_clock, _data, _control, memory) = board(8);
        memory.load(2, &[1, 2, 0x103]).unwrap();
        assert_eq!(memory.dump(1, 4), vec![(1, 0), (2, 1), (3, 2), (4, 3)]);
        assert_eq!(memory.dump(6, 10), vec![(6, 0), (7, 0)]);

        assert_eq!(
            memory.load(6, &[1, 2, 3]),
            Err(SimError::ProgramTooLarge { start: 6, len: 3, size: 8 })
        );
        assert!(memory.poke(8, 1).is_err());

        memory.clear();
        assert_eq!(memory.cell(3), Some(0));
    }

    #[test]
    fn test_invalid_configuration() {
        let mut clock = Clock::default();
        let bus = Bus::shared();
        let zero = MemoryConfig { size: 0, ..MemoryConfig::default() };
        assert_eq!(
            Memory::new(Wiring::to(&mut clock, &bus, &bus), zero).err(),
            Some(SimError::InvalidSize)
        );
        assert_eq!(
            Memory::new(Wiring::new().clock(&mut clock), MemoryConfig::default()).err(),
            Some(SimError::MissingDataBus)
        );
    }
}
