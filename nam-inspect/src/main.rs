//! nam-inspect - Training metadata inspection tool
//!
//! Reads the training record embedded in a `.nam` artifact and shows,
//! checks, summarizes or attaches it.
//!
//! **Usage:**
//! ```bash
//! nam-inspect [--config <FILE>] [--strict] [--compact] <show|check|summary> <ARTIFACT>
//! nam-inspect attach <ARTIFACT> <RECORD_JSON>
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nam_inspect::commands;
use nam_inspect::{Outcome, EXIT_ERROR};
use nam_metadata::config::{ConfigOverrides, InspectConfig};
use nam_metadata::Artifact;
use std::path::PathBuf;
use tracing::{debug, error};

/// Command-line arguments for nam-inspect
#[derive(Parser, Debug)]
#[command(name = "nam-inspect")]
#[command(about = "Inspect training metadata embedded in NAM model artifacts")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config_dir>/nam-inspect/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter directive (e.g. debug, nam_metadata=trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Treat unrecognized record fields as violations
    #[arg(long, global = true)]
    strict: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the training record as JSON
    Show {
        artifact: PathBuf,
    },
    /// Validate the training record and list every problem
    Check {
        artifact: PathBuf,
    },
    /// Human-readable digest of settings, latency, checks and ESR
    Summary {
        artifact: PathBuf,
    },
    /// Validate a record file and embed it in the artifact
    Attach {
        artifact: PathBuf,
        record: PathBuf,
    },
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            log_level: self.log_level.clone(),
            strict: self.strict.then_some(true),
            pretty: self.compact.then_some(false),
        }
    }
}

fn init_tracing(level: &str) {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args, config: &InspectConfig) -> Result<Outcome> {
    let mut stdout = std::io::stdout().lock();

    let load = |path: &PathBuf| {
        Artifact::load(path).with_context(|| format!("Failed to load {}", path.display()))
    };

    match &args.command {
        Command::Show { artifact } => commands::show(&load(artifact)?, config, &mut stdout),
        Command::Check { artifact } => commands::check(&load(artifact)?, config, &mut stdout),
        Command::Summary { artifact } => commands::summary(&load(artifact)?, config, &mut stdout),
        Command::Attach { artifact, record } => {
            commands::attach(artifact, record, config, &mut stdout)
        }
    }
}

fn main() {
    let args = Args::parse();

    let config = match InspectConfig::resolve(&args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nam-inspect: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };

    init_tracing(&config.log_level);
    debug!("nam-inspect v{} config: {:?}", env!("CARGO_PKG_VERSION"), config);

    match run(args, &config) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}
