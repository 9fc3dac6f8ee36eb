// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! ltfit CLI - Life Time Fitness visit tracking from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show visit counts (default command)
//! ltfit
//!
//! # JSON output
//! ltfit --format json --pretty
//!
//! # Reservations for the next two weeks
//! ltfit reservations --days 14
//!
//! # Refresh on the configured interval
//! ltfit watch
//!
//! # Store the account password in the system keychain
//! ltfit config set-password
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, keys, reservations, visits, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// ltfit CLI - Life Time Fitness visit tracking.
#[derive(Parser)]
#[command(name = "ltfit")]
#[command(about = "Life Time Fitness visit and reservation tracker")]
#[command(long_about = r#"
ltfit logs in to a Life Time Fitness member account and reports club visits
and upcoming reservations.

The username comes from LTFIT_USERNAME or the settings file. The password
comes from LTFIT_PASSWORD or the system keychain (see `ltfit config`).

Examples:
  ltfit                          # Visit counts
  ltfit reservations --days 14   # Upcoming reservations
  ltfit watch                    # Refresh on the configured interval
  ltfit --format json            # JSON output
"#)]
#[command(version)]
#[command(author = "ltfit Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'visits' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show visit counts (default if no command specified).
    #[command(visible_alias = "v")]
    Visits,

    /// List upcoming reservations.
    #[command(visible_alias = "r")]
    Reservations(reservations::ReservationsArgs),

    /// Refresh on an interval and print each result.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Fetch the static API keys from the account page.
    Keys(keys::KeysArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Login rejected or more steps required on the website.
    AuthFailed = 2,
    /// Data could not be refreshed.
    Unavailable = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("ltfit=debug,info")
    } else {
        EnvFilter::new("ltfit=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ltfit");

    let result = match &cli.command {
        Some(Commands::Visits) | None => visits::run(&cli).await,
        Some(Commands::Reservations(args)) => reservations::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Keys(args)) => keys::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
