//! rb-counter CLI: loads the initial id/count file, then answers commands read
//! from stdin, one reply per line on stdout.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, CombinedLogger, Config as LogConfig, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use rb_counter::{run, Config, Counter};

/// Event counter backed by a red-black tree
#[derive(Parser, Debug)]
#[command(name = "rb-counter")]
#[command(version)]
#[command(
    about = "Event counter backed by a red-black tree",
    long_about = "Loads <INPUT> (first line: record count, then one '<id> <count>' per line, \
ascending by id) and answers commands from stdin:\n\n  \
increase <id> <m>\n  reduce <id> <m>\n  count <id>\n  inrange <id1> <id2>\n  \
next <id>\n  previous <id>\n  quit"
)]
struct Args {
    /// Initial id/count file, sorted ascending by id
    input: PathBuf,

    /// Log verbosity on stderr (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Skip the ascending-id check on the input file
    #[arg(long)]
    no_verify_order: bool,

    /// Accept a header count that differs from the number of records
    #[arg(long)]
    lenient_count: bool,
}

fn initialize_logging(args: &Args) -> io::Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        args.log_level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = &args.log_file {
        loggers.push(WriteLogger::new(args.log_level, LogConfig::default(), File::create(path)?));
    }
    // Only fails if a logger is already installed.
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = initialize_logging(&args) {
        eprintln!("rb-counter: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    let config = Config {
        verify_order: !args.no_verify_order,
        strict_count: !args.lenient_count,
    };
    let mut counter = match Counter::load_with_config(&args.input, &config) {
        Ok(counter) => counter,
        Err(e) => {
            error!("failed to load {}: {e}", args.input.display());
            eprintln!("rb-counter: {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    match run(&mut counter, stdin, stdout) {
        Ok(stats) => {
            info!(
                "session done: {} commands, {} rejected, {} ids",
                stats.executed,
                stats.rejected,
                counter.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("rb-counter: {e}");
            ExitCode::FAILURE
        }
    }
}
