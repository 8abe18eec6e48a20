//! Control-word script parser.
//!
//! Syntax:
//! ```text
//! ; Comment
//! poke 0 3        ; store 3 in memory cell 0
//! bus 0x00        ; put a value on the data bus
//! cycle MAI       ; assert exactly MAI and clock one full cycle
//! cycle MR AI     ; several lines at once
//! lines SUB       ; set the control lines without clocking
//! cycle           ; clock again with the current lines
//! step            ; a single half cycle
//! expect out 8    ; check a value
//! ```
//!
//! Control lines are named by mnemonic (RI, RO, MR, MW, MAI, AI, BI, SUB,
//! EO, CI, CO, CE) or given as a raw control bus index. Numbers may be
//! decimal, `0x` hex or `0b` binary.

use std::fmt;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::sim::ControlLine;
use crate::script::ScriptError;

/// Something an `expect` command can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Bus,
    Reg,
    Mar,
    Mem,
    A,
    B,
    Out,
    Pc,
    Clock,
}

impl Target {
    fn parse(word: &str) -> Option<Self> {
        let target = match word.to_ascii_lowercase().as_str() {
            "bus" => Target::Bus,
            "reg" => Target::Reg,
            "mar" => Target::Mar,
            "mem" => Target::Mem,
            "a" => Target::A,
            "b" => Target::B,
            "out" => Target::Out,
            "pc" => Target::Pc,
            "clock" => Target::Clock,
            _ => return None,
        };
        Some(target)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Bus => "bus",
            Target::Reg => "reg",
            Target::Mar => "mar",
            Target::Mem => "mem",
            Target::A => "a",
            Target::B => "b",
            Target::Out => "out",
            Target::Pc => "pc",
            Target::Clock => "clock",
        };
        f.write_str(name)
    }
}

/// A control line named in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineRef {
    Named(ControlLine),
    Index(usize),
}

/// One script command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Bus(u32),
    Poke { addr: usize, value: u32 },
    Lines(Vec<LineRef>),
    /// `None` keeps the current control lines.
    Cycle(Option<Vec<LineRef>>),
    Step,
    Expect { target: Target, value: u32 },
}

/// A command and the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub line: usize,
    pub command: Command,
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Statement>,
}

impl Script {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Parse script source text.
pub fn parse(source: &str) -> Result<Script, ScriptError> {
    let mut script = Script::default();

    for (line_num, line) in source.lines().enumerate() {
        let line_num = line_num + 1;

        // Strip comments
        let code = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let words: Vec<&str> = code.split_whitespace().collect();
        let Some((&keyword, args)) = words.split_first() else {
            continue;
        };

        let command = parse_command(keyword, args, line_num)?;
        script.statements.push(Statement { line: line_num, command });
    }

    Ok(script)
}

/// Read and parse a script file.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Script, ScriptError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ScriptError::Io(e.to_string()))?;
    parse(&source)
}

fn parse_command(keyword: &str, args: &[&str], line: usize) -> Result<Command, ScriptError> {
    let syntax = |message: String| ScriptError::Parse { line, message };

    match keyword.to_ascii_lowercase().as_str() {
        "bus" => {
            let [value] = args else {
                return Err(syntax("bus requires one value".into()));
            };
            Ok(Command::Bus(parse_number(value, line)?))
        }

        "poke" => {
            let [addr, value] = args else {
                return Err(syntax("poke requires an address and a value".into()));
            };
            Ok(Command::Poke {
                addr: parse_number(addr, line)? as usize,
                value: parse_number(value, line)?,
            })
        }

        "lines" => Ok(Command::Lines(parse_lines(args, line)?)),

        "cycle" => {
            if args.is_empty() {
                Ok(Command::Cycle(None))
            } else {
                Ok(Command::Cycle(Some(parse_lines(args, line)?)))
            }
        }

        "step" => {
            if !args.is_empty() {
                return Err(syntax("step takes no arguments".into()));
            }
            Ok(Command::Step)
        }

        "expect" => {
            let [target, value] = args else {
                return Err(syntax("expect requires a target and a value".into()));
            };
            let target = Target::parse(target)
                .ok_or_else(|| syntax(format!("unknown target '{}'", target)))?;
            Ok(Command::Expect { target, value: parse_number(value, line)? })
        }

        other => Err(syntax(format!("unknown command '{}'", other))),
    }
}

fn parse_lines(args: &[&str], line: usize) -> Result<Vec<LineRef>, ScriptError> {
    args.iter()
        .map(|word| {
            if word.starts_with(|c: char| c.is_ascii_digit()) {
                let index = parse_number(word, line)? as usize;
                return Ok(LineRef::Index(index));
            }
            word.parse::<ControlLine>()
                .map(LineRef::Named)
                .map_err(|message| ScriptError::Parse { line, message })
        })
        .collect()
}

/// Parse a decimal, `0x` hex or `0b` binary number.
pub fn parse_number(word: &str, line: usize) -> Result<u32, ScriptError> {
    let lower = word.to_ascii_lowercase();
    let cleaned = lower.replace('_', "");
    let parsed = if let Some(hex) = cleaned.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = cleaned.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else {
        cleaned.parse::<u32>()
    };
    parsed.map_err(|e| ScriptError::Parse {
        line,
        message: format!("invalid number '{}': {}", word, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let script = parse(
            "; add two numbers\n\
             poke 0 3\n\
             bus 0x00      ; address zero\n\
             \n\
             cycle MAI\n\
             cycle mr ai\n\
             lines SUB 13\n\
             cycle\n\
             step\n\
             expect out 0b1000\n",
        )
        .unwrap();

        let commands: Vec<&Command> = script.statements.iter().map(|s| &s.command).collect();
        assert_eq!(commands.len(), 8);
        assert_eq!(*commands[0], Command::Poke { addr: 0, value: 3 });
        assert_eq!(*commands[1], Command::Bus(0));
        assert_eq!(*commands[2], Command::Cycle(Some(vec![LineRef::Named(ControlLine::Mai)])));
        assert_eq!(
            *commands[3],
            Command::Cycle(Some(vec![
                LineRef::Named(ControlLine::Mr),
                LineRef::Named(ControlLine::Ai)
            ]))
        );
        assert_eq!(
            *commands[4],
            Command::Lines(vec![LineRef::Named(ControlLine::Sub), LineRef::Index(13)])
        );
        assert_eq!(*commands[5], Command::Cycle(None));
        assert_eq!(*commands[6], Command::Step);
        assert_eq!(*commands[7], Command::Expect { target: Target::Out, value: 8 });

        // Source lines are kept for error reports.
        assert_eq!(script.statements[2].line, 5);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_number("42", 1).unwrap(), 42);
        assert_eq!(parse_number("0xFF", 1).unwrap(), 255);
        assert_eq!(parse_number("0b1010_0101", 1).unwrap(), 0xA5);
        assert!(parse_number("12z", 1).is_err());
    }

    #[test]
    fn test_unknown_command_reports_line() {
        let err = parse("cycle\nfrobnicate 3\n").unwrap_err();
        match err {
            ScriptError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("frobnicate"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_line_and_target() {
        assert!(parse("cycle XX").is_err());
        assert!(parse("expect flags 1").is_err());
        assert!(parse("bus").is_err());
        assert!(parse("step 2").is_err());
    }

    #[test]
    fn test_lines_without_arguments_clears() {
        let script = parse("lines").unwrap();
        assert_eq!(script.statements[0].command, Command::Lines(vec![]));
    }
}
