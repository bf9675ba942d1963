//! Upload command implementation.

use super::process::process_with_progress;
use crate::app::App;
use crate::cli::Output;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the upload command.
pub async fn run_upload(
    file: &str,
    title: Option<&str>,
    author: Option<&str>,
    process: bool,
    user_id: &str,
    app: &App,
) -> Result<()> {
    let path = Path::new(file);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("'{}' has no usable file name", file))?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", file))?;

    let title = match title {
        Some(title) => title.to_string(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string(),
    };

    let doc = app
        .orchestrator
        .upload_document(user_id, &title, author, file_name, &bytes)
        .await?;

    Output::success(&format!("Uploaded \"{}\"", doc.title));
    Output::kv("Id", &doc.id.to_string());
    Output::kv("Stored as", &doc.file_path);
    Output::kv("Type", &doc.file_type);

    if process {
        println!();
        process_with_progress(app, doc.id).await?;
    } else {
        println!();
        Output::info(&format!("Run 'roteiro process {}' to index it.", doc.id));
    }

    Ok(())
}
