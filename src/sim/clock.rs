//! Two-phase system clock.
//!
//! The clock toggles between low and high. Every low-to-high transition
//! dispatches the rising-edge clients, every high-to-low transition the
//! falling-edge clients, in registration order and to completion before the
//! transition returns.
//!
//! Time is virtual: the free-running timer and the deferred second half of
//! [`Clock::cycle`] are events on the clock's own timeline, fired by
//! [`Clock::advance`]. A front end drives `advance` with real elapsed time;
//! tests drive it directly.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use log::{debug, trace, warn};
use serde::{Serialize, Deserialize};
use crate::sim::SimError;

/// Shortest allowed full-cycle interval in milliseconds.
pub const MIN_INTERVAL_MS: u32 = 2;
/// Longest allowed full-cycle interval in milliseconds.
pub const MAX_INTERVAL_MS: u32 = 5000;

/// A callback run on a clock edge. Returning an error aborts the rest of
/// that edge's dispatch.
pub type EdgeClient = Box<dyn FnMut() -> Result<(), SimError>>;

/// Clamp an interval to the supported range.
#[inline]
pub fn clamp_interval(interval_ms: u32) -> u32 {
    interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

/// A clock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Rising,
    Falling,
}

/// Clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Full-cycle interval in milliseconds (clamped to 2-5000).
    pub interval_ms: u32,
    /// Start free-running as soon as the clock is built.
    pub auto_start: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            auto_start: false,
        }
    }
}

/// Progress of a single [`Clock::cycle`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
    /// First half dispatched, second half still scheduled.
    Pending,
    /// Both halves dispatched.
    Complete,
    /// A client failed during one of the halves.
    Aborted,
}

/// Completion signal for a cycle started with [`Clock::cycle`].
#[derive(Debug, Clone)]
pub struct CycleHandle {
    status: Rc<Cell<CycleStatus>>,
}

impl CycleHandle {
    fn new() -> Self {
        Self {
            status: Rc::new(Cell::new(CycleStatus::Pending)),
        }
    }

    fn resolve(&self, status: CycleStatus) {
        self.status.set(status);
    }

    pub fn status(&self) -> CycleStatus {
        self.status.get()
    }

    pub fn is_complete(&self) -> bool {
        self.status() == CycleStatus::Complete
    }

    pub fn is_pending(&self) -> bool {
        self.status() == CycleStatus::Pending
    }
}

/// State of the single-cycle sequencer.
enum CyclePhase {
    Idle,
    PendingFall { due_ms: u64, handle: CycleHandle },
}

/// The system clock.
pub struct Clock {
    high: bool,
    interval_ms: u32,
    running: bool,
    now_ms: u64,
    /// Due time of the next free-run half step.
    next_tick_ms: Option<u64>,
    cycle: CyclePhase,
    /// Half steps performed since construction.
    transitions: u64,
    rising: Vec<EdgeClient>,
    falling: Vec<EdgeClient>,
}

impl Clock {
    /// Create a clock in the low phase.
    pub fn new(config: ClockConfig) -> Self {
        let mut clock = Self {
            high: false,
            interval_ms: clamp_interval(config.interval_ms),
            running: false,
            now_ms: 0,
            next_tick_ms: None,
            cycle: CyclePhase::Idle,
            transitions: 0,
            rising: Vec::new(),
            falling: Vec::new(),
        };
        if config.auto_start {
            clock.start();
        }
        clock
    }

    /// Create a manually stepped clock with the given interval.
    pub fn manual(interval_ms: u32) -> Self {
        Self::new(ClockConfig { interval_ms, auto_start: false })
    }

    /// Enter free-run mode, replacing any pending free-run timer.
    pub fn start(&mut self) {
        self.running = true;
        self.next_tick_ms = Some(self.now_ms + self.half_period_ms());
        debug!("clock started, interval {} ms", self.interval_ms);
    }

    /// Leave free-run mode. The current phase is kept.
    pub fn stop(&mut self) {
        if self.running {
            debug!("clock stopped at {} ms", self.now_ms);
        }
        self.running = false;
        self.next_tick_ms = None;
    }

    /// Perform one half cycle, dispatching the clients of the edge.
    pub fn step(&mut self) -> Result<(), SimError> {
        let edge = if self.high { Edge::Falling } else { Edge::Rising };
        self.high = !self.high;
        self.transitions += 1;
        trace!("{:?} edge #{} at {} ms", edge, self.transitions, self.now_ms);

        let clients = match edge {
            Edge::Rising => &mut self.rising,
            Edge::Falling => &mut self.falling,
        };
        for (i, client) in clients.iter_mut().enumerate() {
            if let Err(e) = client() {
                warn!("{:?} edge dispatch aborted at client {}: {}", edge, i, e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run one full cycle.
    ///
    /// Stops free-run, performs the first half step at once and schedules
    /// the second half step one half period later. Returns `None` without
    /// doing anything if a cycle is already pending.
    pub fn cycle(&mut self) -> Result<Option<CycleHandle>, SimError> {
        if self.is_cycle_pending() {
            return Ok(None);
        }
        self.stop();

        let handle = CycleHandle::new();
        if let Err(e) = self.step() {
            handle.resolve(CycleStatus::Aborted);
            return Err(e);
        }
        self.cycle = CyclePhase::PendingFall {
            due_ms: self.now_ms + self.half_period_ms(),
            handle: handle.clone(),
        };
        Ok(Some(handle))
    }

    /// Change the interval, restarting free-run if it was running.
    pub fn set_interval(&mut self, interval_ms: u32) {
        let was_running = self.running;
        self.stop();
        self.interval_ms = clamp_interval(interval_ms);
        debug!("clock interval set to {} ms", self.interval_ms);
        if was_running {
            self.start();
        }
    }

    /// Move virtual time forward by `elapsed_ms`, firing every event that
    /// falls due on the way. Returns the number of half steps performed.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<usize, SimError> {
        let target = self.now_ms.saturating_add(elapsed_ms);
        let mut steps = 0;

        loop {
            let cycle_due = match &self.cycle {
                CyclePhase::PendingFall { due_ms, .. } => Some(*due_ms),
                CyclePhase::Idle => None,
            };
            let next = match (cycle_due, self.next_tick_ms) {
                (Some(c), Some(t)) => c.min(t),
                (Some(c), None) => c,
                (None, Some(t)) => t,
                (None, None) => break,
            };
            if next > target {
                break;
            }
            self.now_ms = next;

            if cycle_due == Some(next) {
                self.finish_cycle()?;
            } else {
                self.next_tick_ms = Some(next + self.half_period_ms());
                self.step()?;
            }
            steps += 1;
        }

        self.now_ms = target;
        Ok(steps)
    }

    /// Advance exactly to the end of the pending cycle, if any.
    pub fn settle(&mut self) -> Result<usize, SimError> {
        match &self.cycle {
            CyclePhase::PendingFall { due_ms, .. } => {
                let remaining = due_ms.saturating_sub(self.now_ms);
                self.advance(remaining)
            }
            CyclePhase::Idle => Ok(0),
        }
    }

    fn finish_cycle(&mut self) -> Result<(), SimError> {
        let phase = std::mem::replace(&mut self.cycle, CyclePhase::Idle);
        if let CyclePhase::PendingFall { handle, .. } = phase {
            match self.step() {
                Ok(()) => handle.resolve(CycleStatus::Complete),
                Err(e) => {
                    handle.resolve(CycleStatus::Aborted);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Register a callback for low-to-high transitions.
    pub fn add_rising_client<F>(&mut self, client: F)
    where
        F: FnMut() -> Result<(), SimError> + 'static,
    {
        self.rising.push(Box::new(client));
    }

    /// Register a callback for high-to-low transitions.
    pub fn add_falling_client<F>(&mut self, client: F)
    where
        F: FnMut() -> Result<(), SimError> + 'static,
    {
        self.falling.push(Box::new(client));
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.high
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_cycle_pending(&self) -> bool {
        matches!(self.cycle, CyclePhase::PendingFall { .. })
    }

    #[inline]
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Time between consecutive half steps.
    #[inline]
    pub fn half_period_ms(&self) -> u64 {
        u64::from(self.interval_ms / 2).max(1)
    }

    /// Current virtual time.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Half steps performed since construction.
    #[inline]
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn rising_client_count(&self) -> usize {
        self.rising.len()
    }

    pub fn falling_client_count(&self) -> usize {
        self.falling.len()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("high", &self.high)
            .field("interval_ms", &self.interval_ms)
            .field("running", &self.running)
            .field("now_ms", &self.now_ms)
            .field("cycle_pending", &self.is_cycle_pending())
            .field("rising_clients", &self.rising.len())
            .field("falling_clients", &self.falling.len())
            .finish()
    }
}
