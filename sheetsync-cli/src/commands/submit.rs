//! Submit commands - append a tool or pattern row.

use anyhow::{bail, Result};
use clap::Args;
use sheetsync_core::transform::split_disciplines;
use sheetsync_core::{Entity, PatternEntity, PatternLink, ToolEntity};

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Most links a pattern row holds.
const MAX_LINKS: usize = 3;

/// Arguments for submit-tool.
#[derive(Args)]
pub struct SubmitToolArgs {
    /// Tool name.
    #[arg(long)]
    pub name: String,

    /// Short description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Homepage URL.
    #[arg(long, default_value = "")]
    pub url: String,

    /// Comma-separated disciplines.
    #[arg(long, default_value = "")]
    pub discipline: String,

    /// Free-form notes.
    #[arg(long, default_value = "")]
    pub notes: String,
}

/// Arguments for submit-pattern.
#[derive(Args)]
pub struct SubmitPatternArgs {
    /// Pattern name.
    #[arg(long)]
    pub name: String,

    /// Category, e.g. web or mobile.
    #[arg(long, default_value = "")]
    pub category: String,

    /// Short description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Where the pattern is used.
    #[arg(long = "where", default_value = "")]
    pub where_: String,

    /// Link as TITLE=URL. May be given up to three times.
    #[arg(long = "link", value_parser = parse_link)]
    pub links: Vec<PatternLink>,
}

/// Parses `TITLE=URL`, splitting at the first `=`.
fn parse_link(raw: &str) -> Result<PatternLink, String> {
    let (title, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TITLE=URL, got {raw:?}"))?;
    let (title, url) = (title.trim(), url.trim());
    if url.is_empty() {
        return Err("link URL is empty".to_string());
    }
    Ok(PatternLink::new(url, title))
}

/// Runs submit-tool.
pub async fn run_tool(args: &SubmitToolArgs, cli: &Cli) -> Result<ExitCode> {
    let entity = Entity::Tool(ToolEntity {
        name: args.name.trim().to_string(),
        description: args.description.clone(),
        url: args.url.clone(),
        discipline: split_disciplines(&args.discipline),
        notes: args.notes.clone(),
        ..ToolEntity::default()
    });
    submit(&entity, cli).await
}

/// Runs submit-pattern.
pub async fn run_pattern(args: &SubmitPatternArgs, cli: &Cli) -> Result<ExitCode> {
    if args.links.len() > MAX_LINKS {
        bail!("A pattern holds at most {MAX_LINKS} links, got {}", args.links.len());
    }

    let entity = Entity::Pattern(PatternEntity {
        name: args.name.trim().to_string(),
        category: args.category.clone(),
        description: args.description.clone(),
        where_: args.where_.clone(),
        links: args.links.clone(),
        ..PatternEntity::default()
    });
    submit(&entity, cli).await
}

async fn submit(entity: &Entity, cli: &Cli) -> Result<ExitCode> {
    if entity.name().is_empty() {
        bail!("Name must not be empty");
    }

    let facade = cli.facade().await?;
    facade.try_submit_entity(entity).await?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Submitted {} {:?}", entity.kind(), entity.name());
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&serde_json::json!({ "submitted": entity }))?);
        }
    }

    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link() {
        let link = parse_link("Docs=https://example.com/?a=b").unwrap();
        assert_eq!(link, PatternLink::new("https://example.com/?a=b", "Docs"));

        assert!(parse_link("https://example.com").is_err());
        assert!(parse_link("Docs=").is_err());
    }
}
