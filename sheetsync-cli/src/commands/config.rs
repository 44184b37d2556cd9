//! Config command - show the effective configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use sheetsync_store::SyncConfig;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the configuration after defaults and environment overrides.
    Show,

    /// Show the configuration file path.
    Path,

    /// Write the default configuration to the configuration path.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    let path = cli.config.clone().unwrap_or_else(SyncConfig::default_path);

    match &args.action {
        ConfigAction::Show => {
            let config = cli.load_config().await?;
            let formatter = JsonFormatter::new(cli.pretty || cli.format == OutputFormat::Text);
            println!("{}", formatter.format(&config)?);
        }
        ConfigAction::Path => match cli.format {
            OutputFormat::Text => println!("{}", path.display()),
            OutputFormat::Json => {
                let formatter = JsonFormatter::new(cli.pretty);
                let paths = serde_json::json!({ "config_file": path.display().to_string() });
                println!("{}", formatter.format(&paths)?);
            }
        },
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            SyncConfig::default().save_to(&path).await?;
            if !cli.quiet {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(ExitCode::Success)
}
