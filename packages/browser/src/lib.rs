#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Browser session abstraction for scraping server-rendered web applications.
//!
//! The [`BrowserSession`] trait is the capability the reporter workflow
//! drives: fetch a page, submit a form, click an anchor or table row,
//! change a `<select>`. Every navigation yields a fresh [`Page`] snapshot.
//! [`http::HttpSession`] implements the trait over `reqwest` with a cookie
//! store and `scraper` for parsing, understanding the ASP.NET WebForms
//! postback protocol; tests substitute an in-memory page graph.

pub mod http;
pub mod page;
pub mod postback;

use async_trait::async_trait;

pub use reqwest::Url;

pub use page::{Anchor, Cell, Element, Field, FieldKind, Form, Page, Row, Table};

/// Errors raised by a browser session.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// An HTTP request failed or returned an error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Parser message.
        message: String,
    },

    /// A required element was not present on the page.
    #[error("No {kind} '{key}' on page")]
    NotFound {
        /// What was looked up (`"form"`, `"table"`, `"field"`, ...).
        kind: &'static str,
        /// The name, id or index that was looked up.
        key: String,
    },

    /// The session was used after [`BrowserSession::release`].
    #[error("Browser session already released")]
    Released,
}

impl BrowserError {
    /// Builds a [`BrowserError::NotFound`].
    #[must_use]
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}

/// A stateful browsing session.
///
/// Navigations are strictly sequential: each call waits for the resulting
/// page before returning, and the server-side state it mutates is shared by
/// every later call.
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the URL is invalid or the request fails.
    async fn fetch(&mut self, url: &str) -> Result<Page, BrowserError>;

    /// Submits `form` (a possibly modified copy of one of `page`'s forms).
    ///
    /// `control` names the submit control that was activated, if any; its
    /// value is sent along with the other fields.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the request fails.
    async fn submit(
        &mut self,
        page: &Page,
        form: &Form,
        control: Option<&str>,
    ) -> Result<Page, BrowserError>;

    /// Clicks `anchor` on `page`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the navigation fails.
    async fn click_anchor(&mut self, page: &Page, anchor: &Anchor) -> Result<Page, BrowserError>;

    /// Clicks row `index` of the table with id `table_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the row does not exist or the navigation
    /// fails.
    async fn click_row(
        &mut self,
        page: &Page,
        table_id: &str,
        index: usize,
    ) -> Result<Page, BrowserError>;

    /// Selects `value` in the `<select>` called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the control or option does not exist or
    /// the resulting navigation fails.
    async fn select_option(
        &mut self,
        page: &Page,
        name: &str,
        value: &str,
    ) -> Result<Page, BrowserError>;

    /// Hands back a page that will not be read again, letting the session
    /// drop any per-page state.
    fn discard(&mut self, page: Page) {
        drop(page);
    }

    /// Closes the session. Later navigations fail with
    /// [`BrowserError::Released`].
    fn release(&mut self);
}

/// Clicks the first anchor on `page` whose text is exactly `text`.
///
/// Returns `Ok(None)` when there is no such anchor.
///
/// # Errors
///
/// Returns [`BrowserError`] if the anchor exists but the navigation fails.
pub async fn find_and_click_anchor<S: BrowserSession + ?Sized>(
    session: &mut S,
    page: &Page,
    text: &str,
) -> Result<Option<Page>, BrowserError> {
    let Some(anchor) = page.anchor_by_text(text) else {
        return Ok(None);
    };
    session.click_anchor(page, anchor).await.map(Some)
}
