//! Generate command implementation.

use super::scripts::print_script;
use crate::app::App;
use crate::cli::Output;
use crate::script::GenerationRequest;
use anyhow::Result;

/// Run the generate command.
pub async fn run_generate(
    request: GenerationRequest,
    json: bool,
    user_id: &str,
    app: &App,
) -> Result<()> {
    request.validate()?;

    let spinner = Output::spinner("Generating script...");
    let result = app.scripts.generate(user_id, &request).await;
    spinner.finish_and_clear();

    let generated = match result {
        Ok(generated) => generated,
        Err(e) => {
            Output::error(&format!("Generation failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&generated.script)?);
        return Ok(());
    }

    print_script(&generated.script);

    println!();
    if generated.context.is_empty() {
        Output::info("No library passages matched this theme.");
    } else {
        Output::header(&format!("Library context ({})", generated.context.len()));
        for chunk in &generated.context {
            Output::list_item(&format!(
                "{} #{} (score: {:.2})",
                chunk.document_title, chunk.chunk_index, chunk.similarity
            ));
        }
    }
    if let Some(usage) = &generated.usage {
        Output::kv("Tokens", &usage.total_tokens.to_string());
    }
    if !generated.parsed {
        Output::warning("The model did not return structured output; metadata was derived from the theme.");
    }

    println!();
    Output::success(&format!("Draft saved as {}", generated.script.id));
    Ok(())
}
