//! `reqwest`-backed browser session.
//!
//! Keeps cookies across requests and re-parses every response into a
//! [`Page`]. Form submissions send every successful control, which round-trips
//! WebForms' `__VIEWSTATE`/`__EVENTVALIDATION` hidden fields. Anchors, rows
//! and selects that run `__doPostBack` are replayed as a form submission with
//! `__EVENTTARGET`/`__EVENTARGUMENT` filled in.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::postback::{EVENT_ARGUMENT, EVENT_TARGET, PostBack};
use crate::{Anchor, BrowserError, BrowserSession, Form, Page};

/// The Judge Center only renders its full UI for Internet Explorer 11.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; rv:11.0) like Gecko";

/// Upper bound on a single request, so a hung server surfaces as an error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A browser session over HTTP.
pub struct HttpSession {
    client: Option<reqwest::Client>,
}

impl HttpSession {
    /// Creates a session with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, BrowserError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Creates a session that identifies itself as `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Http`] if the HTTP client cannot be built.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&reqwest::Client, BrowserError> {
        self.client.as_ref().ok_or(BrowserError::Released)
    }

    async fn load(request: reqwest::RequestBuilder) -> Result<Page, BrowserError> {
        let response = request.send().await?.error_for_status()?;
        let url = response.url().clone();
        let body = response.text().await?;
        log::trace!("Loaded {url} ({} bytes)", body.len());
        Ok(Page::parse(url, &body))
    }

    async fn send_form(
        &self,
        page: &Page,
        form: &Form,
        control: Option<&str>,
    ) -> Result<Page, BrowserError> {
        let client = self.client()?;
        let action = page.resolve(form.action())?;
        let params = form.submission(control);
        log::trace!(
            "Submitting form '{}' to {action} ({} fields)",
            form.name(),
            params.len()
        );

        let request = if form.is_get() {
            client.get(action).query(&params)
        } else {
            client.post(action).form(&params)
        };
        Self::load(request).await
    }

    /// Replays a postback through the form that owns the event fields.
    async fn post_back(
        &self,
        page: &Page,
        form: Option<&Form>,
        postback: &PostBack,
    ) -> Result<Page, BrowserError> {
        let form = form
            .or_else(|| page.form_with_field(EVENT_TARGET))
            .or_else(|| page.forms().first())
            .ok_or_else(|| BrowserError::not_found("form", EVENT_TARGET))?;

        let mut form = form.clone();
        form.set_hidden(EVENT_TARGET, &postback.target);
        form.set_hidden(EVENT_ARGUMENT, &postback.argument);
        log::debug!(
            "Postback target={} argument={}",
            postback.target,
            postback.argument
        );
        self.send_form(page, &form, None).await
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn fetch(&mut self, url: &str) -> Result<Page, BrowserError> {
        let url = Url::parse(url).map_err(|e| BrowserError::InvalidUrl {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        let request = self.client()?.get(url);
        Self::load(request).await
    }

    async fn submit(
        &mut self,
        page: &Page,
        form: &Form,
        control: Option<&str>,
    ) -> Result<Page, BrowserError> {
        self.send_form(page, form, control).await
    }

    async fn click_anchor(&mut self, page: &Page, anchor: &Anchor) -> Result<Page, BrowserError> {
        let postback = anchor
            .onclick()
            .and_then(PostBack::parse)
            .or_else(|| anchor.href().and_then(PostBack::parse));
        if let Some(postback) = postback {
            return self.post_back(page, None, &postback).await;
        }

        match anchor.href() {
            Some(href) if !href.starts_with("javascript:") && !href.starts_with('#') => {
                let url = page.resolve(href)?;
                let request = self.client()?.get(url);
                Self::load(request).await
            }
            _ => Ok(page.clone()),
        }
    }

    async fn click_row(
        &mut self,
        page: &Page,
        table_id: &str,
        index: usize,
    ) -> Result<Page, BrowserError> {
        let row = page
            .table_by_id(table_id)?
            .rows()
            .get(index)
            .ok_or_else(|| BrowserError::not_found("row", format!("{table_id}[{index}]")))?;

        match PostBack::parse(row.attribute("onclick")) {
            Some(postback) => self.post_back(page, None, &postback).await,
            None => Ok(page.clone()),
        }
    }

    async fn select_option(
        &mut self,
        page: &Page,
        name: &str,
        value: &str,
    ) -> Result<Page, BrowserError> {
        let form = page
            .form_with_field(name)
            .ok_or_else(|| BrowserError::not_found("select", name))?;
        let field = form
            .field(name)
            .ok_or_else(|| BrowserError::not_found("select", name))?;
        if !field.options().is_empty() && !field.options().iter().any(|o| o == value) {
            return Err(BrowserError::not_found("option", value));
        }

        let postback = field.onchange().and_then(PostBack::parse);
        let mut form = form.clone();
        form.set_value(name, value)?;

        match postback {
            Some(postback) => self.post_back(page, Some(&form), &postback).await,
            None => Ok(page.with_form(form)),
        }
    }

    fn discard(&mut self, page: Page) {
        log::trace!("Discarding page {}", page.url());
    }

    fn release(&mut self) {
        if self.client.take().is_some() {
            log::debug!("Browser session released");
        }
    }
}
