//! Cache command - inspect and clear the response cache.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove cached rows, entities and the access token.
    Clear,

    /// Show the cache directory.
    Path,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        CacheAction::Clear => {
            let facade = cli.facade().await?;
            facade.clear_cache().await?;
            info!("Cache cleared");
            if !cli.quiet {
                println!("Cache cleared");
            }
        }
        CacheAction::Path => {
            let dir = cli
                .load_config()
                .await?
                .cache_dir
                .map(|d| d.display().to_string())
                .unwrap_or_default();
            match cli.format {
                OutputFormat::Text => println!("{dir}"),
                OutputFormat::Json => {
                    let formatter = JsonFormatter::new(cli.pretty);
                    println!("{}", formatter.format(&serde_json::json!({ "cache_dir": dir }))?);
                }
            }
        }
    }
    Ok(ExitCode::Success)
}
