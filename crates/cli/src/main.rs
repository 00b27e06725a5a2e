// gridiron CLI - reconcile two sources' football results into one game table

mod db;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_STORE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "Reconcile game results from two scoreboard sources")]
#[command(version)]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one season/week and store the new games
    #[command(after_help = "\
Examples:
  gridiron run week1.recon.toml
  gridiron run week1.recon.toml --json
  gridiron run week1.recon.toml --dry-run --output report.json
  gridiron run week1.recon.toml --db football.db --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Database file; overrides [store] path in the config
        #[arg(long, env = "GRIDIRON_DB")]
        db: Option<PathBuf>,

        /// Report only: skip every decision and write nothing
        #[arg(long)]
        dry_run: bool,

        /// Exit 3 when unknown teams or multiply-matched games remain
        #[arg(long)]
        strict: bool,
    },

    /// Validate a run config without running
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Manage the reference tables and inspect stored games
    Db {
        /// Database file
        #[arg(long, env = "GRIDIRON_DB")]
        db: PathBuf,

        #[command(subcommand)]
        command: db::DbCommands,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, db, dry_run, strict } => recon::cmd_run(recon::RunOptions {
            config,
            json,
            output,
            db,
            dry_run,
            strict,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Db { db, command } => db::cmd_db(db, command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<gridiron_store::StoreError> for CliError {
    fn from(e: gridiron_store::StoreError) -> Self {
        Self::new(EXIT_STORE, e.to_string())
    }
}
