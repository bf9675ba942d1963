//! Search command implementation.

use crate::app::App;
use crate::cli::Output;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, user_id: &str, app: &App) -> Result<()> {
    let limit = limit.unwrap_or(app.settings.search.default_limit);

    let spinner = Output::spinner("Searching...");
    let chunks = app.context.search(query, user_id, limit).await;
    spinner.finish_and_clear();

    if chunks.is_empty() {
        Output::warning("No results found matching your query.");
        Output::info("Searching needs processed books and an OpenAI key for embeddings.");
    } else {
        Output::header(&format!("Found {} results", chunks.len()));
        for chunk in &chunks {
            Output::search_result(chunk);
        }
    }

    Ok(())
}
