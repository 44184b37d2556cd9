// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `SheetSync` CLI - read and append sheet-backed entities from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List tools
//! sheetsync fetch tools
//!
//! # Patterns as JSON, bypassing the cache
//! sheetsync fetch patterns --refresh --format json --pretty
//!
//! # Append a tool
//! sheetsync submit-tool --name Figma --url figma.com --discipline "Design, Prototyping"
//!
//! # Verify credentials and token exchange
//! sheetsync check
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sheetsync_fetch::SyncFacade;
use sheetsync_store::{default_cache_dir, SyncConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{cache, check, config, fetch, submit};

// ============================================================================
// CLI Definition
// ============================================================================

/// `SheetSync` CLI - spreadsheet-backed tool and pattern listings.
#[derive(Parser)]
#[command(name = "sheetsync")]
#[command(about = "Quota-aware spreadsheet data sync client")]
#[command(long_about = r#"
SheetSync reads tool and pattern listings from spreadsheets using a
service account, caching results and staying within request quotas.

Credentials are read from, in order:
  credentials_path in the config file
  SHEETSYNC_CREDENTIALS
  GOOGLE_APPLICATION_CREDENTIALS
  <config dir>/sheetsync/service_account.json

Examples:
  sheetsync fetch tools              # Tools listing
  sheetsync fetch patterns --strict  # Fail instead of printing nothing
  sheetsync check                    # Credentials and token exchange
  sheetsync cache clear              # Drop cached rows and tokens
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

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
    /// Fetch tools or patterns.
    #[command(visible_alias = "f")]
    Fetch(fetch::FetchArgs),

    /// Append a tool row.
    SubmitTool(submit::SubmitToolArgs),

    /// Append a pattern row.
    SubmitPattern(submit::SubmitPatternArgs),

    /// Check credentials and token exchange.
    Check,

    /// Manage the response cache.
    Cache(cache::CacheArgs),

    /// Show configuration.
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
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The fetch produced no entities.
    NoData = 2,
}

impl Cli {
    /// Loads configuration from `--config` or the default path.
    ///
    /// The CLI persists its cache under the platform cache directory unless
    /// the file names another one.
    pub async fn load_config(&self) -> Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::load_from(path).await?,
            None => SyncConfig::load().await?,
        };
        if config.cache_dir.is_none() {
            config.cache_dir = Some(default_cache_dir());
        }
        Ok(config)
    }

    /// Builds the facade from the loaded configuration.
    pub async fn facade(&self) -> Result<SyncFacade> {
        Ok(SyncFacade::from_config(self.load_config().await?))
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("sheetsync=debug,info")
    } else {
        EnvFilter::new("sheetsync=warn")
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

    let result = match &cli.command {
        Commands::Fetch(args) => fetch::run(args, &cli).await,
        Commands::SubmitTool(args) => submit::run_tool(args, &cli).await,
        Commands::SubmitPattern(args) => submit::run_pattern(args, &cli).await,
        Commands::Check => check::run(&cli).await,
        Commands::Cache(args) => cache::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
