//! Line-oriented command protocol.
//!
//! One command per line, verb first (case-insensitive), arguments as decimal
//! integers separated by whitespace:
//!
//! ```text
//! increase <id> <m>    reduce <id> <m>    count <id>
//! inrange <id1> <id2>  next <id>          previous <id>    quit
//! ```

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use log::{debug, warn};

use crate::counter::Counter;
use crate::error::{Error, Result};

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Increase { id: i64, amount: i64 },
    Reduce { id: i64, amount: i64 },
    Count { id: i64 },
    InRange { low: i64, high: i64 },
    Next { id: i64 },
    Previous { id: i64 },
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().unwrap_or("");
        let args: Vec<&str> = tokens.collect();

        let (name, arity) = match verb.to_ascii_lowercase().as_str() {
            "increase" => ("increase", 2),
            "reduce" => ("reduce", 2),
            "count" => ("count", 1),
            "inrange" => ("inrange", 2),
            "next" => ("next", 1),
            "previous" => ("previous", 1),
            // Anything after `quit` is ignored.
            "quit" => return Ok(Command::Quit),
            _ => return Err(Error::UnknownCommand(verb.to_string())),
        };
        if args.len() != arity {
            return Err(Error::Arity {
                command: name,
                expected: arity,
                found: args.len(),
            });
        }

        let arg = |i: usize| -> Result<i64> {
            args[i].parse().map_err(|source| Error::InvalidArgument {
                arg: args[i].to_string(),
                source,
            })
        };
        Ok(match name {
            "increase" => Command::Increase {
                id: arg(0)?,
                amount: arg(1)?,
            },
            "reduce" => Command::Reduce {
                id: arg(0)?,
                amount: arg(1)?,
            },
            "count" => Command::Count { id: arg(0)? },
            "inrange" => Command::InRange {
                low: arg(0)?,
                high: arg(1)?,
            },
            "next" => Command::Next { id: arg(0)? },
            "previous" => Command::Previous { id: arg(0)? },
            _ => unreachable!("verb validated above"),
        })
    }
}

/// Output of an executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A single count
    Value(i64),
    /// An `(id, count)` neighbour, printed as `0 0` when there is none
    Entry(Option<(i64, i64)>),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(v) => write!(f, "{v}"),
            Reply::Entry(Some((id, count))) => write!(f, "{id} {count}"),
            Reply::Entry(None) => f.write_str("0 0"),
        }
    }
}

impl Counter {
    /// Runs one command. Returns `None` for [`Command::Quit`].
    pub fn execute(&mut self, command: Command) -> Option<Reply> {
        let reply = match command {
            Command::Increase { id, amount } => Reply::Value(self.increase(id, amount)),
            Command::Reduce { id, amount } => Reply::Value(self.reduce(id, amount)),
            Command::Count { id } => Reply::Value(self.count(id)),
            Command::InRange { low, high } => Reply::Value(self.in_range(low, high)),
            Command::Next { id } => Reply::Entry(self.next(id)),
            Command::Previous { id } => Reply::Entry(self.previous(id)),
            Command::Quit => return None,
        };
        Some(reply)
    }
}

/// Tally of a [`run`] session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Commands that produced a reply
    pub executed: usize,
    /// Lines skipped because they did not parse
    pub rejected: usize,
}

/// Reads commands from `input` until `quit` or end of input, writing one reply
/// line per executed command to `output`.
///
/// A line that fails to parse, or is not valid UTF-8, is logged and skipped;
/// the loop carries on with the next line. Read and write failures end the
/// session with an error.
pub fn run<R: BufRead, W: Write>(counter: &mut Counter, mut input: R, mut output: W) -> Result<Stats> {
    let mut stats = Stats::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warn!("line {line_no}: {e}");
                stats.rejected += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) if e.is_command_error() => {
                warn!("line {line_no}: {e}");
                stats.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        debug!("{command:?}");
        let Some(reply) = counter.execute(command) else {
            break;
        };
        writeln!(output, "{reply}")?;
        stats.executed += 1;
    }
    output.flush()?;
    Ok(stats)
}
