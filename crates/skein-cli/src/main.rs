//! CLI frontend for the Skein narrative execution engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "skein",
    about = "Skein — play and check narrative script assets",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a script asset without playing it
    Check {
        /// Path to the script JSON asset
        script: PathBuf,
    },

    /// Play a script interactively, reading choices from stdin
    Play {
        /// Path to the script JSON asset
        script: PathBuf,

        /// Level to start (default: the script's entry node)
        #[arg(short, long)]
        level: Option<u32>,

        /// Path checkpoints are saved to (default: in-memory only)
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,

        /// Jump to a node by name before playing (debug)
        #[arg(long)]
        skip_to: Option<String>,
    },

    /// Auto-play a script headless with seeded random choices
    Run {
        /// Path to the script JSON asset
        script: PathBuf,

        /// RNG seed for deterministic choice selection
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Level to start (default: the script's entry node)
        #[arg(short, long)]
        level: Option<u32>,

        /// Print every line of the run, not just the summary
        #[arg(long)]
        transcript: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { script } => commands::check::run(&script),
        Commands::Play {
            script,
            level,
            checkpoint,
            skip_to,
        } => commands::play::run(&script, level, checkpoint.as_deref(), skip_to.as_deref()),
        Commands::Run {
            script,
            seed,
            level,
            transcript,
        } => commands::run::run(&script, seed, level, transcript),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "skein=debug" } else { "skein=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
