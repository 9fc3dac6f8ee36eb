//! Visits command - refresh once and show visit counts.

use anyhow::Result;
use ltfit_store::SettingsStore;
use tracing::{info, warn};

use super::{build_coordinator, exit_code_for};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the visits command.
pub async fn run(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let coordinator = build_coordinator(&store, None).await?;

    let outcome = coordinator.refresh().await;
    let state = coordinator.state();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_visits(coordinator.username(), &state));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_visits(coordinator.username(), &state)?);
        }
    }

    match outcome {
        Ok(snapshot) => {
            info!(total = snapshot.total_visits, "Visits updated");
            Ok(())
        }
        Err(failure) => {
            warn!(error = %failure, "Refresh failed");
            std::process::exit(exit_code_for(&failure) as i32);
        }
    }
}
