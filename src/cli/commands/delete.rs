//! Delete command implementation.

use super::parse_id;
use crate::app::App;
use crate::cli::Output;
use anyhow::{bail, Result};

/// Run the delete command.
pub async fn run_delete(id: &str, app: &App) -> Result<()> {
    let id = parse_id(id)?;
    let outcome = app.orchestrator.delete_document(id).await;

    if outcome.success {
        Output::success(&format!("Deleted document {}", id));
        Ok(())
    } else {
        let message = outcome.error.unwrap_or_else(|| "Unknown error".to_string());
        Output::error(&message);
        bail!(message)
    }
}
