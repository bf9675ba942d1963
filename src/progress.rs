//! Progress reporting for long-running pipeline steps.
//!
//! Reporting is fire-and-forget: a callback that panics is logged and
//! otherwise ignored so it can never abort the step that reported.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{trace, warn};

/// Callback receiving a human-readable label and a percentage (0-100).
pub type ProgressCallback = Arc<dyn Fn(&str, u8) + Send + Sync>;

/// Wraps an optional progress callback.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    /// Reporter that forwards to `callback`.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Reporter that drops every update.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Report a milestone. Percentages above 100 are clamped.
    pub fn report(&self, label: &str, percent: u8) {
        let percent = percent.min(100);
        trace!(percent, "{}", label);

        if let Some(callback) = &self.callback {
            if catch_unwind(AssertUnwindSafe(|| callback(label, percent))).is_err() {
                warn!("Progress callback panicked at '{}' ({}%)", label, percent);
            }
        }
    }

    /// Report step `done` of `total` mapped linearly into `[from, to]`.
    pub fn report_step(&self, label: &str, done: usize, total: usize, from: u8, to: u8) {
        let span = to.saturating_sub(from) as f32;
        let fraction = if total == 0 {
            1.0
        } else {
            done.min(total) as f32 / total as f32
        };
        self.report(label, from + (span * fraction).round() as u8);
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
