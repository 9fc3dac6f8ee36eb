//! Reservations command - list upcoming reservations.

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::Args;
use ltfit_fetch::api::RESERVATION_WINDOW_DAYS;
use ltfit_store::{SettingsStore, events_between, next_event};
use tracing::{debug, warn};

use super::{build_coordinator, exit_code_for};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the reservations command.
#[derive(Args)]
pub struct ReservationsArgs {
    /// Days ahead to list.
    #[arg(long, short, default_value_t = RESERVATION_WINDOW_DAYS)]
    pub days: u64,

    /// Show only the next reservation.
    #[arg(long)]
    pub next: bool,
}

/// Runs the reservations command.
pub async fn run(args: &ReservationsArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let coordinator = build_coordinator(&store, None).await?;

    let snapshot = match coordinator.refresh().await {
        Ok(snapshot) => snapshot,
        Err(failure) => {
            warn!(error = %failure, "Refresh failed");
            if !cli.quiet {
                eprintln!("{}", TextFormatter::new(!cli.no_color).format_failure(&failure));
            }
            std::process::exit(exit_code_for(&failure) as i32);
        }
    };

    if let Some(error) = coordinator.state().reservations_error {
        anyhow::bail!("Reservations could not be fetched: {error}");
    }

    let now = Local::now();
    let events: Vec<_> = if args.next {
        next_event(&snapshot.reservations, &now).into_iter().collect()
    } else {
        let end = i64::try_from(args.days)
            .ok()
            .and_then(Duration::try_days)
            .and_then(|window| now.checked_add_signed(window))
            .context("--days is out of range")?;
        events_between(&snapshot.reservations, &now, &end)
    };
    debug!(count = events.len(), "Reservations in window");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_events(&events));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_events(&events)?);
        }
    }

    Ok(())
}
