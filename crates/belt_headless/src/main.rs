//! Headless belt runner.
//!
//! Plays scenarios with an autopilot player, without any presentation
//! layer. Designed for balance runs and CI determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Play the built-in duel and write metrics
//! cargo run -p belt_headless -- run --scenario duel --output results/duel.json
//!
//! # Check that the same seed always ends on the same state
//! cargo run -p belt_headless -- verify --scenario duel --runs 5
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `-v`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use belt_headless::{
    runner::{verify_determinism, HeadlessRunner},
    scenario::Scenario,
    Result,
};

#[derive(Parser)]
#[command(name = "belt_headless")]
#[command(about = "Headless asteroid-belt runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game with the autopilot
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the scenario length
        #[arg(short, long)]
        turns: Option<u32>,

        /// Write metrics JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that repeated runs end on the same state
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Print a scenario as RON
    Config {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard")]
        scenario: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            scenario,
            seed,
            turns,
            output,
        } => cmd_run(&scenario, seed, turns, output),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Config { scenario } => cmd_config(&scenario),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(name: &str, seed: Option<u64>) -> Result<Scenario> {
    let scenario = Scenario::resolve(name)?;
    Ok(match seed {
        Some(seed) => scenario.with_seed(seed),
        None => scenario,
    })
}

/// Play a single game
fn cmd_run(
    scenario: &str,
    seed: Option<u64>,
    turns: Option<u32>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut scenario = load_scenario(scenario, seed)?;
    if let Some(turns) = turns {
        scenario = scenario.with_turns(turns);
    }
    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        turns = scenario.turns,
        "Starting game"
    );

    let metrics = HeadlessRunner::run(&scenario)?;

    match output {
        Some(path) => {
            metrics.save(&path)?;
            eprintln!("Metrics written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&metrics)?),
    }
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism by running the same seed several times
fn cmd_verify(scenario: &str, seed: Option<u64>, runs: u32) -> Result<ExitCode> {
    let scenario = load_scenario(scenario, seed)?;
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        scenario.seed,
        runs
    );

    let report = verify_determinism(&scenario, runs)?;
    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  run {run}: {hash:016x}");
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Print the resolved scenario
fn cmd_config(scenario: &str) -> Result<ExitCode> {
    let scenario = load_scenario(scenario, None)?;
    match scenario.to_ron_string() {
        Ok(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("FATAL: Cannot serialize scenario: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
