//! List command implementation.

use crate::app::App;
use crate::cli::Output;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(app: &App) -> Result<()> {
    match app.orchestrator.library().list_documents().await {
        Ok(documents) => {
            if documents.is_empty() {
                Output::info("No books in the library yet. Use 'roteiro upload <file>' to add one.");
            } else {
                Output::header(&format!("Library ({})", documents.len()));
                println!();

                for summary in &documents {
                    Output::document_info(summary);
                }

                let total_chunks: usize = documents.iter().map(|d| d.chunk_count).sum();
                println!();
                Output::kv("Total books", &documents.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
