//! Object naming for uploaded files.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const MAX_FILE_NAME_CHARS: usize = 255;

/// Make a file name safe to use as an object path.
///
/// Anything outside `[a-zA-Z0-9.-]` becomes `_`, runs of `_` and `.` are
/// collapsed, leading and trailing `_` are dropped, and the result is
/// lowercased and capped at 255 characters.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        let collapses = matches!(c, '_' | '.') && out.ends_with(c);
        if !collapses {
            out.push(c);
        }
    }

    out.trim_matches('_')
        .to_lowercase()
        .chars()
        .take(MAX_FILE_NAME_CHARS)
        .collect()
}

/// Unique object path: `"{unix millis}-{document id}-{sanitized name}"`.
pub fn storage_path(file_name: &str, document_id: Uuid, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        now.timestamp_millis(),
        document_id.simple(),
        sanitize_file_name(file_name)
    )
}
