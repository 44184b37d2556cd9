//! Fetch command - read and display entities of one kind.

use anyhow::Result;
use clap::Args;
use sheetsync_core::EntityKind;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Entity kind: tools or patterns.
    pub kind: EntityKind,

    /// Drop cached rows for this kind before fetching.
    #[arg(long)]
    pub refresh: bool,

    /// Report the failure instead of printing an empty listing.
    #[arg(long)]
    pub strict: bool,
}

/// Runs the fetch command.
pub async fn run(args: &FetchArgs, cli: &Cli) -> Result<ExitCode> {
    let facade = cli.facade().await?;

    if args.refresh {
        facade.invalidate(args.kind).await;
    }

    info!(kind = %args.kind, "Fetching entities");
    let entities = if args.strict {
        facade.load_entities(args.kind).await?
    } else {
        facade.fetch_entities(args.kind).await
    };
    let last_loaded = facade.last_loaded(args.kind).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            print!("{}", formatter.format_entities(args.kind, &entities));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_entities(args.kind, &entities, last_loaded)?);
        }
    }

    if entities.is_empty() {
        return Ok(ExitCode::NoData);
    }
    Ok(ExitCode::Success)
}
