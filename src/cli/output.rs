//! CLI output formatting utilities.

use crate::progress::ProgressReporter;
use crate::rag::RetrievedChunk;
use crate::store::{DocumentStatus, DocumentSummary, Script, ScriptStatus};
use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one library document.
    pub fn document_info(summary: &DocumentSummary) {
        let doc = &summary.document;
        let author = doc
            .author
            .as_ref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default();
        println!(
            "  {} {}{} [{}] ({}, {} chunks, {} embedded, {})",
            style("*").cyan(),
            style(&doc.title).bold(),
            author,
            document_status_style(doc.status).apply_to(doc.status),
            style(doc.id).dim(),
            summary.chunk_count,
            summary.embedded_chunks,
            format_bytes(doc.file_size)
        );
    }

    /// Print one script as a list row.
    pub fn script_info(script: &Script) {
        println!(
            "  {} {} [{}] ({}, {} min, {}, {})",
            style("*").cyan(),
            style(&script.title).bold(),
            script_status_style(script.status).apply_to(script.status),
            style(script.id).dim(),
            script.duration_minutes,
            script.target_language,
            script.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Print a search result.
    pub fn search_result(chunk: &RetrievedChunk) {
        let author = chunk
            .document_author
            .as_ref()
            .map(|a| format!(" ({})", a))
            .unwrap_or_default();
        println!(
            "\n{} {}{} #{} (score: {:.2})",
            style(">>").green(),
            style(&chunk.document_title).bold(),
            author,
            style(chunk.chunk_index).cyan(),
            chunk.similarity
        );
        println!("   {}", content_preview(&chunk.content, 200));
    }

    /// Create a percentage progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(bar_style);
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// A progress reporter that drives `pb`.
    pub fn progress_reporter(pb: &ProgressBar) -> ProgressReporter {
        let pb = pb.clone();
        ProgressReporter::new(Arc::new(move |label: &str, percent: u8| {
            pb.set_position(u64::from(percent));
            pb.set_message(label.to_string());
        }))
    }
}

fn document_status_style(status: DocumentStatus) -> Style {
    match status {
        DocumentStatus::Ready => Style::new().green(),
        DocumentStatus::Error => Style::new().red(),
        DocumentStatus::Uploading | DocumentStatus::Processing => Style::new().yellow(),
    }
}

fn script_status_style(status: ScriptStatus) -> Style {
    match status {
        ScriptStatus::Draft => Style::new().yellow(),
        ScriptStatus::Approved => Style::new().cyan(),
        ScriptStatus::Final => Style::new().green(),
    }
}

/// Format a byte count.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= KB * KB {
        format!("{:.1} MB", bytes_f / (KB * KB))
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Mask an API key, keeping its last four characters.
pub fn mask_key(key: Option<&str>) -> String {
    match key.map(str::trim).filter(|k| !k.is_empty()) {
        None => "(not set)".to_string(),
        Some(k) => {
            let chars: Vec<char> = k.chars().collect();
            if chars.len() <= 4 {
                "****".to_string()
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("****{}", tail)
            }
        }
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_respects_char_boundaries() {
        assert_eq!(content_preview("ação\nfinal", 20), "ação final");
        assert_eq!(content_preview("çççççç", 3), "ççç...");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(None), "(not set)");
        assert_eq!(mask_key(Some("  ")), "(not set)");
        assert_eq!(mask_key(Some("abc")), "****");
        assert_eq!(mask_key(Some("sk-123456789")), "****6789");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_progress_reporter_moves_bar() {
        let pb = ProgressBar::hidden();
        pb.set_length(100);
        let reporter = Output::progress_reporter(&pb);
        reporter.report("Chunking", 40);
        assert_eq!(pb.position(), 40);
        assert_eq!(pb.message(), "Chunking");
    }
}
