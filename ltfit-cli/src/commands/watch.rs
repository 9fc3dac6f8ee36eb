//! Watch command - refresh on an interval and print each result.

use anyhow::{Context, Result};
use clap::Args;
use ltfit_core::StartOfWeek;
use ltfit_fetch::ApiClient;
use ltfit_store::{Coordinator, CoordinatorState, RefreshPhase, SettingsStore};
use std::io::{Write, stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::build_coordinator;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the configured interval).
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Minimum interval to use.
    #[arg(long, default_value = "60")]
    pub min_interval: u64,

    /// First day of the week for this session (name or 0-6, Monday = 0).
    #[arg(long)]
    pub start_of_week: Option<String>,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let interval = args
        .interval
        .map(|secs| Duration::from_secs(secs.max(args.min_interval)));
    let coordinator = Arc::new(build_coordinator(&store, interval).await?);

    if let Some(day) = &args.start_of_week {
        let day = StartOfWeek::parse(day).context("Invalid --start-of-week")?;
        coordinator.update_start_of_week_day(day);
    }

    info!(
        interval_secs = coordinator.interval().as_secs(),
        start_of_week = %coordinator.start_of_week_day(),
        "Starting watch mode"
    );

    let mut rx = coordinator.subscribe();
    let handle = Arc::clone(&coordinator).spawn();
    let mut printed = 0;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if state.phase == RefreshPhase::Idle && state.refreshes > printed {
                    printed = state.refreshes;
                    render(&state, &coordinator, cli)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch mode");
                break;
            }
        }
    }

    coordinator.shutdown();
    handle.await?;
    Ok(())
}

fn render(state: &CoordinatorState, coordinator: &Coordinator<ApiClient>, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            // Clear screen
            print!("\x1b[2J\x1b[H");
            stdout().flush()?;

            let now = chrono::Local::now();
            println!(
                "ltfit Watch Mode - {} (refresh: {}s)",
                now.format("%H:%M:%S"),
                coordinator.interval().as_secs()
            );
            println!("{}", "─".repeat(50));
            println!();

            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_visits(coordinator.username(), state));

            if state.last_failure.as_ref().is_some_and(|f| f.is_auth()) {
                println!();
                println!("Scheduled refreshes paused until credentials are fixed.");
            }

            println!();
            println!("Press Ctrl+C to exit");
        }
        OutputFormat::Json => {
            // One line per refresh
            let formatter = JsonFormatter::new(false);
            println!("{}", formatter.format_visits(coordinator.username(), state)?);
        }
    }
    Ok(())
}
