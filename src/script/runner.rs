//! Script execution against a [`Breadboard`].

use log::{debug, info};
use serde::{Serialize, Deserialize};
use crate::logic::Bit;
use crate::script::{Command, LineRef, Script, ScriptError, Statement, Target};
use crate::sim::{BoardSnapshot, Breadboard, SimError};

/// Board state after a clocking command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub line: usize,
    pub snapshot: BoardSnapshot,
}

/// Outcome of a script run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Full cycles clocked.
    pub cycles: usize,
    /// Single half steps clocked.
    pub half_steps: usize,
    /// `expect` commands that passed.
    pub checks: usize,
    /// Filled only when tracing.
    pub trace: Vec<TraceEntry>,
}

/// Run every statement in order, stopping at the first failure.
pub fn run(board: &mut Breadboard, script: &Script, trace: bool) -> Result<RunReport, ScriptError> {
    let mut report = RunReport::default();

    for statement in &script.statements {
        execute(board, statement, &mut report)?;

        let clocked = matches!(statement.command, Command::Cycle(_) | Command::Step);
        if trace && clocked {
            report.trace.push(TraceEntry {
                line: statement.line,
                snapshot: board.snapshot(),
            });
        }
    }

    info!(
        "script finished: {} cycles, {} half steps, {} checks",
        report.cycles, report.half_steps, report.checks
    );
    Ok(report)
}

fn execute(board: &mut Breadboard, statement: &Statement, report: &mut RunReport) -> Result<(), ScriptError> {
    let line = statement.line;
    let sim = |source: SimError| ScriptError::Sim { line, source };
    debug!("line {}: {:?}", line, statement.command);

    match &statement.command {
        Command::Bus(value) => board.set_data_bus(*value),

        Command::Poke { addr, value } => board.memory().poke(*addr, *value).map_err(sim)?,

        Command::Lines(lines) => set_lines(board, lines),

        Command::Cycle(lines) => {
            if let Some(lines) = lines {
                set_lines(board, lines);
            }
            board.cycle().map_err(sim)?;
            report.cycles += 1;
        }

        Command::Step => {
            board.step().map_err(sim)?;
            report.half_steps += 1;
        }

        Command::Expect { target, value } => {
            let actual = read_target(board, *target);
            if actual != Some(*value) {
                return Err(ScriptError::Expectation {
                    line,
                    target: *target,
                    expected: *value,
                    actual,
                });
            }
            report.checks += 1;
        }
    }

    Ok(())
}

/// Set the control bus to exactly `lines`.
fn set_lines(board: &Breadboard, lines: &[LineRef]) {
    let map = *board.lines();
    let mut control = board.control_bus().borrow_mut();
    control.clear();
    for line in lines {
        let index = match *line {
            LineRef::Named(name) => map.index(name),
            LineRef::Index(index) => index,
        };
        control.set(index, Some(Bit::High));
    }
}

/// Current value of `target`; `None` for a memory cell that does not exist.
pub fn read_target(board: &Breadboard, target: Target) -> Option<u32> {
    let value = match target {
        Target::Bus => board.data_bus_value(),
        Target::Reg => board.register().value(),
        Target::Mar => board.memory().address() as u32,
        Target::Mem => return board.memory().current(),
        Target::A => board.alu().a().value(),
        Target::B => board.alu().b().value(),
        Target::Out => board.alu().output().value(),
        Target::Pc => board.counter().value(),
        Target::Clock => board.clock().is_high() as u32,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse;
    use crate::sim::BoardConfig;

    fn run_source(source: &str) -> Result<RunReport, ScriptError> {
        let mut board = Breadboard::new(BoardConfig::default()).unwrap();
        let script = parse(source).unwrap();
        run(&mut board, &script, false)
    }

    #[test]
    fn test_add_and_subtract_program() {
        let report = run_source(
            "poke 0 3\n\
             poke 1 5\n\
             bus 0\n\
             cycle MAI\n\
             cycle MR AI\n\
             bus 1\n\
             cycle MAI\n\
             cycle MR BI\n\
             expect out 8\n\
             cycle SUB\n\
             expect out 0xFE\n",
        )
        .unwrap();
        assert_eq!(report.cycles, 5);
        assert_eq!(report.checks, 2);
    }

    #[test]
    fn test_memory_read_after_write() {
        let report = run_source(
            "bus 2\n\
             cycle MAI\n\
             bus 0x5A\n\
             cycle MW MR\n\
             expect mem 0x5A\n\
             expect bus 0x5A\n\
             expect mar 2\n",
        )
        .unwrap();
        assert_eq!(report.checks, 3);
    }

    #[test]
    fn test_counter_program() {
        let report = run_source(
            "lines CE\n\
             cycle\n\
             cycle\n\
             cycle\n\
             expect pc 3\n\
             step\n\
             expect clock 1\n",
        )
        .unwrap();
        assert_eq!(report.cycles, 3);
        assert_eq!(report.half_steps, 1);
    }

    #[test]
    fn test_failed_expectation() {
        let err = run_source("bus 4\nexpect bus 5\n").unwrap_err();
        assert_eq!(
            err,
            ScriptError::Expectation { line: 2, target: Target::Bus, expected: 5, actual: Some(4) }
        );
    }

    #[test]
    fn test_raw_line_index() {
        // Index 6 is AI in the default map.
        run_source("bus 9\ncycle 6\nexpect a 9\n").unwrap();
    }

    #[test]
    fn test_out_of_range_address_aborts() {
        let err = run_source("bus 200\ncycle MAI\ncycle MR\n").unwrap_err();
        assert_eq!(
            err,
            ScriptError::Sim { line: 3, source: SimError::AddressOutOfRange { address: 200, size: 16 } }
        );
    }

    #[test]
    fn test_trace_records_clocked_lines() {
        let mut board = Breadboard::new(BoardConfig::default()).unwrap();
        let script = parse("bus 1\ncycle AI\nstep\nexpect a 1\n").unwrap();
        let report = run(&mut board, &script, true).unwrap();
        let lines: Vec<usize> = report.trace.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(report.trace[0].snapshot.a, 1);
    }
}
