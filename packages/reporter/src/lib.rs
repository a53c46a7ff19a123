#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Judge Center investigation reporter.
//!
//! Logs in to the Judge Center, walks every page of the investigations
//! list and opens each investigation to read its summary, witnesses,
//! infractions and statements. Page element names live in a TOML
//! [`config::PageConfig`]; table positions in [`layout`]. The browser is
//! abstracted behind [`judge_center_browser::BrowserSession`].

pub mod config;
pub mod extract;
pub mod layout;
pub mod progress;
pub mod workflow;

#[cfg(test)]
mod testing;

use judge_center_browser::BrowserError;

pub use config::{ConfigError, DetailPageConfig, ListPageConfig, LoginPageConfig, PageConfig};
pub use workflow::{LoginOutcome, Reporter};

/// Errors that abort a scrape run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Navigation failed or a required element was missing.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Page configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The detail page opened for a list row shows a different
    /// investigation.
    #[error("List row for investigation {list_id} opened investigation {detail_id}")]
    IdMismatch {
        /// Id read from the list row.
        list_id: i64,
        /// Id read from the detail page.
        detail_id: i64,
    },

    /// A date cell did not match the configured format.
    #[error("Cannot parse date '{text}' with format '{format}': {source}")]
    Date {
        /// The text that was parsed.
        text: String,
        /// The chrono format string.
        format: String,
        /// Underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A `Key: Value` cell did not match the configured pattern.
    #[error("No key/value pair in '{text}'")]
    KeyValue {
        /// The text that was searched.
        text: String,
    },

    /// A table was missing an expected row or cell.
    #[error("Table '{table}' has no cell at row {row}, column {column}")]
    MissingCell {
        /// Table id.
        table: String,
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },

    /// A statement's info cell had too few lines.
    #[error("Statement row {row} has no line {line}")]
    MissingLine {
        /// Statement table row index.
        row: usize,
        /// Line index after blank lines are dropped.
        line: usize,
    },
}
