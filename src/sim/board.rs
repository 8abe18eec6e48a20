//! The reference breadboard.
//!
//! [`Breadboard`] owns the clock and the two buses and wires every module
//! to them in a fixed order: general-purpose register, memory (address
//! register first), ALU (A, B, output, adder) and program counter. That
//! order is the rising-edge dispatch order, and it decides what a loader
//! sees when a driver is asserted on the same edge: a module wired earlier
//! can hand a value to one wired later within one edge, the other way round
//! takes a second edge with the drive line still high.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::logic::Bit;
use crate::sim::{
    Alu, AluConfig, Bus, Clock, ClockConfig, Counter, CounterConfig, Memory, MemoryConfig,
    Register, RegisterConfig, SharedBus, SimError, Wiring,
};

/// The named control signals of the breadboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlLine {
    /// Register in: load the register from the bus.
    Ri,
    /// Register out: drive the register onto the bus.
    Ro,
    /// Memory read: drive the addressed cell onto the bus.
    Mr,
    /// Memory write: store the bus into the addressed cell.
    Mw,
    /// Memory address in.
    Mai,
    /// ALU A in.
    Ai,
    /// ALU B in.
    Bi,
    /// ALU subtract select.
    Sub,
    /// ALU sum out.
    Eo,
    /// Counter in.
    Ci,
    /// Counter out.
    Co,
    /// Counter enable (increment).
    Ce,
}

impl ControlLine {
    pub const ALL: [ControlLine; 12] = [
        ControlLine::Ri,
        ControlLine::Ro,
        ControlLine::Mr,
        ControlLine::Mw,
        ControlLine::Mai,
        ControlLine::Ai,
        ControlLine::Bi,
        ControlLine::Sub,
        ControlLine::Eo,
        ControlLine::Ci,
        ControlLine::Co,
        ControlLine::Ce,
    ];

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ControlLine::Ri => "RI",
            ControlLine::Ro => "RO",
            ControlLine::Mr => "MR",
            ControlLine::Mw => "MW",
            ControlLine::Mai => "MAI",
            ControlLine::Ai => "AI",
            ControlLine::Bi => "BI",
            ControlLine::Sub => "SUB",
            ControlLine::Eo => "EO",
            ControlLine::Ci => "CI",
            ControlLine::Co => "CO",
            ControlLine::Ce => "CE",
        }
    }
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for ControlLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        ControlLine::ALL
            .into_iter()
            .find(|line| line.mnemonic() == upper)
            .ok_or_else(|| format!("unknown control line '{}'", s))
    }
}

/// Control bus index of each signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineMap {
    pub ri: usize,
    pub ro: usize,
    pub mr: usize,
    pub mw: usize,
    pub mai: usize,
    pub ai: usize,
    pub bi: usize,
    pub sub: usize,
    pub eo: usize,
    pub ci: usize,
    pub co: usize,
    pub ce: usize,
}

impl Default for LineMap {
    fn default() -> Self {
        Self {
            ri: 1,
            ro: 2,
            mr: 3,
            mw: 4,
            mai: 5,
            ai: 6,
            bi: 7,
            sub: 8,
            eo: 9,
            ci: 10,
            co: 11,
            ce: 12,
        }
    }
}

impl LineMap {
    /// Control bus index for `line`.
    pub const fn index(&self, line: ControlLine) -> usize {
        match line {
            ControlLine::Ri => self.ri,
            ControlLine::Ro => self.ro,
            ControlLine::Mr => self.mr,
            ControlLine::Mw => self.mw,
            ControlLine::Mai => self.mai,
            ControlLine::Ai => self.ai,
            ControlLine::Bi => self.bi,
            ControlLine::Sub => self.sub,
            ControlLine::Eo => self.eo,
            ControlLine::Ci => self.ci,
            ControlLine::Co => self.co,
            ControlLine::Ce => self.ce,
        }
    }

    /// Signals mapped to control bus index `index`.
    pub fn lines_at(&self, index: usize) -> impl Iterator<Item = ControlLine> + '_ {
        ControlLine::ALL.into_iter().filter(move |&line| self.index(line) == index)
    }
}

/// Breadboard settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Width of every register, memory cell and the counter.
    pub width: usize,
    pub memory_size: usize,
    pub clock: ClockConfig,
    pub lines: LineMap,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 8,
            memory_size: 16,
            clock: ClockConfig::default(),
            lines: LineMap::default(),
        }
    }
}

impl BoardConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A clock, two buses and every module wired together.
pub struct Breadboard {
    clock: Clock,
    data_bus: SharedBus,
    control_bus: SharedBus,
    register: Register,
    memory: Memory,
    alu: Alu,
    counter: Counter,
    config: BoardConfig,
}

impl Breadboard {
    pub fn new(config: BoardConfig) -> Result<Self, SimError> {
        let mut clock = Clock::new(config.clock);
        let data_bus = Bus::shared();
        let control_bus = Bus::shared();
        let lines = config.lines;
        let width = config.width;

        let register = Register::new(
            Wiring::to(&mut clock, &data_bus, &control_bus),
            RegisterConfig::new(width).load_line(lines.ri).drive_line(lines.ro),
        )?;
        let memory = Memory::new(
            Wiring::to(&mut clock, &data_bus, &control_bus),
            MemoryConfig {
                width,
                size: config.memory_size,
                address_load_line: Some(lines.mai),
                read_line: Some(lines.mr),
                write_line: Some(lines.mw),
            },
        )?;
        let alu = Alu::new(
            Wiring::to(&mut clock, &data_bus, &control_bus),
            AluConfig {
                width,
                a_load_line: Some(lines.ai),
                b_load_line: Some(lines.bi),
                out_drive_line: Some(lines.eo),
                subtract_line: Some(lines.sub),
            },
        )?;
        let counter = Counter::new(
            Wiring::to(&mut clock, &data_bus, &control_bus),
            CounterConfig {
                width,
                load_line: Some(lines.ci),
                increment_line: Some(lines.ce),
                drive_line: Some(lines.co),
            },
        )?;

        Ok(Self {
            clock,
            data_bus,
            control_bus,
            register,
            memory,
            alu,
            counter,
            config,
        })
    }

    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[inline]
    pub fn data_bus(&self) -> &SharedBus {
        &self.data_bus
    }

    #[inline]
    pub fn control_bus(&self) -> &SharedBus {
        &self.control_bus
    }

    #[inline]
    pub fn register(&self) -> &Register {
        &self.register
    }

    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline]
    pub fn alu(&self) -> &Alu {
        &self.alu
    }

    #[inline]
    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    #[inline]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[inline]
    pub fn lines(&self) -> &LineMap {
        &self.config.lines
    }

    pub fn data_bus_value(&self) -> u32 {
        self.data_bus.borrow().value()
    }

    /// Put a value on the data bus by hand.
    pub fn set_data_bus(&self, value: u32) {
        self.data_bus.borrow_mut().set_value(value);
    }

    /// Drive one control signal, or toggle it when `value` is `None`.
    pub fn set_line(&self, line: ControlLine, value: Option<Bit>) {
        let index = self.config.lines.index(line);
        self.control_bus.borrow_mut().set(index, value);
    }

    pub fn is_asserted(&self, line: ControlLine) -> bool {
        self.control_bus.borrow().is_asserted(self.config.lines.index(line))
    }

    /// Set the control bus to exactly `lines`.
    pub fn assert_lines(&self, lines: &[ControlLine]) {
        let mut control = self.control_bus.borrow_mut();
        control.clear();
        for &line in lines {
            control.set(self.config.lines.index(line), Some(Bit::High));
        }
    }

    /// Signals currently high on the control bus.
    pub fn asserted_lines(&self) -> Vec<ControlLine> {
        ControlLine::ALL
            .into_iter()
            .filter(|&line| self.is_asserted(line))
            .collect()
    }

    /// Half a clock cycle.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.clock.step()
    }

    /// A full clock cycle without waiting out the half period: starts a
    /// cycle and advances virtual time to its end.
    pub fn cycle(&mut self) -> Result<(), SimError> {
        if self.clock.cycle()?.is_some() {
            self.clock.settle()?;
        }
        Ok(())
    }

    /// Capture every visible value.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            time_ms: self.clock.now_ms(),
            clock_high: self.clock.is_high(),
            data_bus: self.data_bus_value(),
            control_bus: self.control_bus.borrow().value(),
            asserted: self.asserted_lines(),
            register: self.register.value(),
            address: self.memory.address(),
            memory_cell: self.memory.current(),
            a: self.alu.a().value(),
            b: self.alu.b().value(),
            out: self.alu.output().value(),
            counter: self.counter.value(),
        }
    }
}

impl fmt::Debug for Breadboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breadboard")
            .field("clock", &self.clock)
            .field("data_bus", &*self.data_bus.borrow())
            .field("control_bus", &*self.control_bus.borrow())
            .field("register", &self.register)
            .field("memory", &self.memory)
            .field("alu", &self.alu)
            .field("counter", &self.counter)
            .finish()
    }
}

/// Every value a front panel would show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub time_ms: u64,
    pub clock_high: bool,
    pub data_bus: u32,
    pub control_bus: u32,
    pub asserted: Vec<ControlLine>,
    pub register: u32,
    pub address: usize,
    /// `None` when the address register points past the memory.
    pub memory_cell: Option<u32>,
    pub a: u32,
    pub b: u32,
    pub out: u32,
    pub counter: u32,
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<&str> = self.asserted.iter().map(|l| l.mnemonic()).collect();
        writeln!(f, "t={} ms  clock={}", self.time_ms, if self.clock_high { "HIGH" } else { "LOW" })?;
        writeln!(f, "control: {:#06x} [{}]", self.control_bus, lines.join(" "))?;
        writeln!(f, "bus:     {:#04x} ({})", self.data_bus, self.data_bus)?;
        writeln!(f, "reg:     {:#04x} ({})", self.register, self.register)?;
        match self.memory_cell {
            Some(cell) => writeln!(f, "mem[{}]: {:#04x} ({})", self.address, cell, cell)?,
            None => writeln!(f, "mem[{}]: out of range", self.address)?,
        }
        writeln!(f, "alu:     A={} B={} out={}", self.a, self.b, self.out)?;
        write!(f, "pc:      {}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ControlLine::*;

    fn board() -> Breadboard {
        Breadboard::new(BoardConfig::default()).unwrap()
    }

    #[test]
    fn test_control_line_parsing() {
        assert_eq!("mai".parse::<ControlLine>(), Ok(Mai));
        assert_eq!("EO".parse::<ControlLine>(), Ok(Eo));
        assert!("XYZ".parse::<ControlLine>().is_err());
        for line in ControlLine::ALL {
            assert_eq!(line.mnemonic().parse::<ControlLine>(), Ok(line));
        }
    }

    #[test]
    fn test_default_lines_are_distinct() {
        let map = LineMap::default();
        for line in ControlLine::ALL {
            assert_eq!(map.lines_at(map.index(line)).count(), 1, "{}", line);
        }
    }

    #[test]
    fn test_wiring_registers_every_module() {
        let board = board();
        // register, MAR, memory, A, B, out, adder, counter
        assert_eq!(board.clock().rising_client_count(), 8);
    }

    #[test]
    fn test_register_to_memory_transfer() {
        let mut board = board();
        board.register().set_value(0x2A);

        // Address 3
        board.set_data_bus(3);
        board.assert_lines(&[Mai]);
        board.cycle().unwrap();

        board.assert_lines(&[Ro, Mw]);
        board.cycle().unwrap();
        assert_eq!(board.memory().cell(3), Some(0x2A));
    }

    #[test]
    fn test_add_through_the_bus() {
        let mut board = board();
        board.memory().load(0, &[3, 5]).unwrap();

        board.set_data_bus(0);
        board.assert_lines(&[Mai]);
        board.cycle().unwrap();
        board.assert_lines(&[Mr, Ai]);
        board.cycle().unwrap();

        board.set_data_bus(1);
        board.assert_lines(&[Mai]);
        board.cycle().unwrap();
        board.assert_lines(&[Mr, Bi]);
        board.cycle().unwrap();

        // The register is wired ahead of the ALU, so it latches the bus
        // before the sum is driven: the first edge drives, the second loads.
        board.assert_lines(&[Eo, Ri]);
        board.cycle().unwrap();
        assert_eq!(board.data_bus_value(), 8);
        board.cycle().unwrap();
        assert_eq!(board.register().value(), 8);

        board.assert_lines(&[Sub]);
        board.cycle().unwrap();
        assert_eq!(board.alu().output().value(), 254);

        board.assert_lines(&[Eo, Ri]);
        board.cycle().unwrap();
        board.cycle().unwrap();
        assert_eq!(board.register().value(), 254);
    }

    #[test]
    fn test_counter_counts_and_drives() {
        let mut board = board();
        board.assert_lines(&[Ce]);
        for _ in 0..3 {
            board.cycle().unwrap();
        }
        board.assert_lines(&[Co, Mai]);
        board.cycle().unwrap();
        assert_eq!(board.data_bus_value(), 3);
        // MAR latched before the counter drove the bus.
        assert_eq!(board.memory().address(), 0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut board = board();
        board.set_line(Ai, Some(Bit::High));
        board.set_data_bus(7);
        board.cycle().unwrap();

        let snap = board.snapshot();
        assert_eq!(snap.a, 7);
        assert_eq!(snap.out, 7);
        assert_eq!(snap.asserted, vec![Ai]);
        assert!(!snap.clock_high);
        assert_eq!(snap.time_ms, 500);
        assert!(snap.to_string().contains("A=7"));
    }

    #[test]
    fn test_set_line_toggles() {
        let board = board();
        board.set_line(Sub, None);
        assert!(board.is_asserted(Sub));
        board.set_line(Sub, None);
        assert!(!board.is_asserted(Sub));
    }

    #[test]
    fn test_config_from_json() {
        let config = BoardConfig::from_json(r#"{ "width": 4, "lines": { "ri": 20 } }"#).unwrap();
        assert_eq!(config.width, 4);
        assert_eq!(config.memory_size, 16);
        assert_eq!(config.lines.ri, 20);
        assert_eq!(config.lines.ro, 2);

        let board = Breadboard::new(config).unwrap();
        assert_eq!(board.register().width(), 4);
    }

    #[test]
    fn test_zero_width_board_rejected() {
        let config = BoardConfig { width: 0, ..BoardConfig::default() };
        assert_eq!(Breadboard::new(config).err(), Some(SimError::InvalidWidth(0)));
    }
}
