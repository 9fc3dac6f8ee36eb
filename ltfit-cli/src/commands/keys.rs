//! Keys command - fetch the static API keys.

use anyhow::Result;
use clap::Args;
use ltfit_fetch::{ApiKeyCache, AuthClient, HttpClient, KeyFetcher};
use ltfit_store::SettingsStore;
use tracing::info;

use crate::output::{JsonFormatter, KeysOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the keys command.
#[derive(Args)]
pub struct KeysArgs {
    /// Bypass the key cache.
    #[arg(long)]
    pub force: bool,

    /// Print the full keys instead of masked prefixes.
    #[arg(long)]
    pub reveal: bool,
}

/// Runs the keys command.
pub async fn run(args: &KeysArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let endpoints = store.get().await.endpoints();

    let http = HttpClient::new()?.with_allowed_domains(endpoints.allowed_domains());
    let fetcher = KeyFetcher::new(http.clone(), endpoints.config_page.clone(), ApiKeyCache::shared());
    let auth = AuthClient::new(http, endpoints, fetcher);
    let keys = auth.fetch_api_keys(args.force).await?;
    info!("API keys fetched");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_keys(&keys, args.reveal));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&KeysOutput::new(&keys, args.reveal))?);
        }
    }

    Ok(())
}
