//! Target length of a script for a given video duration.

use serde::Serialize;

/// Average narration speed.
pub const WORDS_PER_MINUTE: f64 = 160.0;

/// Scripts target 10% over the nominal duration.
pub const LENGTH_MARGIN: f64 = 1.1;

/// Average Portuguese word length, trailing space included.
pub const CHARACTERS_PER_WORD: u32 = 8;

/// Required script length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptSize {
    pub words: u32,
    pub characters: u32,
}

/// Words and characters the script must contain to fill `duration_minutes`.
pub fn calculate_script_size(duration_minutes: u32) -> ScriptSize {
    let words = (duration_minutes as f64 * LENGTH_MARGIN * WORDS_PER_MINUTE).round() as u32;
    ScriptSize {
        words,
        characters: words * CHARACTERS_PER_WORD,
    }
}
