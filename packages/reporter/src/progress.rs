//! Progress reporting for a scrape run.
//!
//! The workflow only knows how many investigations it expects (when the list
//! page says so) and when each one has been read. Rendering is left to the
//! caller; the CLI draws an `indicatif` bar.

use std::sync::Arc;

/// Receives progress updates from the workflow.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of investigations the list page announced.
    fn set_total(&self, total: u64);

    /// Records `delta` more investigations as read.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the run as complete.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
