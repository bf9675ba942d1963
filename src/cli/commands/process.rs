//! Process and sweep command implementations.

use super::parse_id;
use crate::app::App;
use crate::cli::Output;
use crate::orchestrator::ProcessOutcome;
use anyhow::Result;
use uuid::Uuid;

/// Run the process command.
pub async fn run_process(id: &str, app: &App) -> Result<()> {
    process_with_progress(app, parse_id(id)?).await
}

/// Process one document behind a progress bar.
pub(super) async fn process_with_progress(app: &App, id: Uuid) -> Result<()> {
    let pb = Output::progress_bar(100, "Starting...");
    let reporter = Output::progress_reporter(&pb);

    let result = app.orchestrator.process_document(id, &reporter).await;
    pb.finish_and_clear();

    match result {
        Ok(ProcessOutcome::Completed { chunks, embedded }) => {
            Output::success(&format!("Document {} is ready", id));
            Output::kv("Chunks", &chunks.to_string());
            Output::kv("Embedded", &embedded.to_string());
            if embedded < chunks {
                Output::warning(
                    "Some chunks have no embedding and will not appear in searches. \
                     Check that an OpenAI key is set with 'roteiro settings set --openai-key'.",
                );
            }
            Ok(())
        }
        Ok(ProcessOutcome::AlreadyRunning) => {
            Output::warning(&format!("Document {} is already being processed.", id));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            Err(e.into())
        }
    }
}

/// Run the sweep command.
pub async fn run_sweep(app: &App) -> Result<()> {
    let spinner = Output::spinner("Looking for stale documents...");
    let report = app.orchestrator.process_stale_documents().await;
    spinner.finish_and_clear();

    if report.found == 0 {
        Output::info("No stale documents found.");
        return Ok(());
    }

    Output::header("Stale documents");
    Output::kv("Found", &report.found.to_string());
    Output::kv("Completed", &report.completed.to_string());
    Output::kv("Skipped", &report.skipped.to_string());
    Output::kv("Failed", &report.failed.to_string());

    if report.failed > 0 {
        Output::warning("Failed documents were marked as error.");
    }

    Ok(())
}
