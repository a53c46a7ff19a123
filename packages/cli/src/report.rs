//! Output of a finished run.

use std::path::Path;

use judge_center_reporter_models::{Investigation, InvestigationSet};

/// Errors writing the result set.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The file could not be written.
    #[error("Cannot write {path}: {source}")]
    Io {
        /// Output file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The set could not be serialized.
    #[error("Cannot serialize investigations: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line per investigation, preceded by a header.
#[must_use]
pub fn summary_lines(set: &InvestigationSet) -> Vec<String> {
    let mut lines = Vec::with_capacity(set.len() + 2);
    lines.push(format!(
        "{} investigation(s) visible to {}",
        set.len(),
        set.name()
    ));
    lines.push(format!(
        "{:>8}  {:<10}  {:<24}  {:<12}  {:>9}  {:>10}",
        "Id", "Incident", "Subject", "Status", "Witnesses", "Statements"
    ));
    lines.extend(set.iter().map(summary_line));
    lines
}

fn summary_line(investigation: &Investigation) -> String {
    let incident = investigation
        .incident_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
    format!(
        "{:>8}  {:<10}  {:<24}  {:<12}  {:>9}  {:>10}",
        investigation.id,
        incident,
        investigation.subject,
        investigation.status,
        investigation.witnesses.len(),
        investigation.statements.len()
    )
}

/// Writes `set` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or the write fails.
pub fn write_json(set: &InvestigationSet, path: &Path) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(set)?;
    std::fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Wrote {} investigations to {}", set.len(), path.display());
    Ok(())
}
