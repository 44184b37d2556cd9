//! Check command - credentials, configured sheets and token exchange.

use anyhow::Result;
use serde::Serialize;
use sheetsync_core::EntityKind;
use sheetsync_fetch::credential_paths;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Result of the check command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Whether credentials were loaded.
    pub credentials: bool,
    /// Credential files tried, in lookup order.
    pub credential_paths: Vec<String>,
    /// Configured sheet per kind.
    pub sheets: Vec<SheetStatus>,
    /// Token exchange failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_error: Option<String>,
}

/// Configuration state of one sheet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetStatus {
    /// Entity kind.
    pub kind: EntityKind,
    /// Spreadsheet id, empty when unset.
    pub spreadsheet_id: String,
    /// Read range.
    pub range: String,
}

impl CheckReport {
    /// Returns true if credentials loaded and a token was obtained.
    pub fn is_healthy(&self) -> bool {
        self.credentials && self.token_error.is_none()
    }
}

/// Runs the check command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.load_config().await?;
    let paths = credential_paths(config.credentials_path.as_deref())
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let sheets = EntityKind::all()
        .iter()
        .map(|&kind| {
            let resource = config.resource(kind);
            SheetStatus {
                kind,
                spreadsheet_id: resource.spreadsheet_id.clone(),
                range: resource.range.clone(),
            }
        })
        .collect();

    let facade = sheetsync_fetch::SyncFacade::from_config(config);
    let token_error = facade.check().await.err().map(|e| e.to_string());

    let report = CheckReport {
        credentials: facade.is_available(),
        credential_paths: paths,
        sheets,
        token_error,
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            print!("{}", formatter.format_check(&report, cli.verbose));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&report)?);
        }
    }

    if report.is_healthy() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::Error)
    }
}
