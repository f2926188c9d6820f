//! Momiji CLI: the REPL and script runner entry point.
//!
//! Parses command-line arguments, initializes logging, loads
//! configuration, and dispatches to either the REPL or the file loader
//! (spec §6 "momiji [PATH]"). Exit codes follow spec §7's table.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{run_file, run_repl};
use config::{Config, ColorChoice};
use error::CliError;

/// Momiji - a small dynamically-typed scripting language.
///
/// With no script path, starts an interactive REPL.
#[derive(Parser, Debug)]
#[command(name = "momiji")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Momiji scripting language", long_about = None)]
struct Cli {
    /// Script to run. Omit to start the REPL.
    path: Vec<PathBuf>,

    /// Log every executed instruction.
    #[arg(long)]
    trace_execution: bool,

    /// Collect on every allocation growth, not just at threshold.
    #[arg(long)]
    stress_gc: bool,

    /// Seed the `maybe` random generator for deterministic runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Control ANSI color in diagnostic output.
    #[arg(long, value_enum)]
    color: Option<ColorChoice>,
}

impl Cli {
    fn apply_to(&self, mut config: Config) -> Config {
        if self.trace_execution {
            config.trace_execution = true;
        }
        if self.stress_gc {
            config.stress_gc = true;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.trace_execution);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let color = cli.color.unwrap_or_default().resolve();
            eprint!("{}", err.render(color));
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging(trace_execution: bool) {
    let filter = if trace_execution { EnvFilter::new("trace") } else { EnvFilter::new("info") };
    let subscriber = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.path.len() > 1 {
        return Err(CliError::Usage);
    }

    let config = cli.apply_to(Config::load()?);

    match cli.path.first() {
        Some(path) => run_file(path, &config),
        None => {
            tracing::info!("starting REPL");
            run_repl(&config)
        }
    }
}
