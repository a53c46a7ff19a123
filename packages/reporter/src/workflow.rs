//! The scrape run: log in, page through the investigations list and read
//! every investigation.
//!
//! Navigation is strictly sequential on one session because the site keeps
//! the list's paging and view state on the server.

use std::sync::Arc;

use judge_center_browser::{
    BrowserError, BrowserSession, Cell, Field, Page, Table, find_and_click_anchor,
};
use judge_center_reporter_models::{Investigation, InvestigationSet, Statement, Witness};

use crate::ReportError;
use crate::config::{DetailPageConfig, ListPageConfig, LoginPageConfig, PageConfig};
use crate::extract::{
    cell_as_date, cell_as_number, decode_key_value, parse_total_count, strip_cell_content,
};
use crate::layout::{
    HEADER_ROWS, RESET_ROW, TARGET_ROW_OFFSET, infraction, list, statement, summary, witness,
};
use crate::progress::{ProgressCallback, null_progress};

/// Result of submitting the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The site landed on the success page.
    LoggedIn,
    /// The site stayed elsewhere, usually on the login page.
    Rejected {
        /// Text of the login error element.
        message: Option<String>,
    },
}

/// Drives a [`BrowserSession`] through the Judge Center.
///
/// The reporter owns the session for the whole run and releases it when
/// dropped, whether the run succeeded or not.
pub struct Reporter<S: BrowserSession> {
    session: S,
    progress: Arc<dyn ProgressCallback>,
}

impl<S: BrowserSession> Reporter<S> {
    /// Creates a reporter that does not report progress.
    #[must_use]
    pub fn new(session: S) -> Self {
        Self {
            session,
            progress: null_progress(),
        }
    }

    /// Reports per-investigation progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Logs in and reads every investigation visible to the user.
    ///
    /// Returns `Ok(None)` when the login is rejected; nothing past the login
    /// page is requested in that case.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on any navigation failure, missing element or
    /// unreadable value. No partial result is returned.
    pub async fn run(
        &mut self,
        pages: &PageConfig,
        user_id: &str,
        password: &str,
    ) -> Result<Option<InvestigationSet>, ReportError> {
        if let LoginOutcome::Rejected { message } =
            self.login(&pages.login, user_id, password).await?
        {
            match message {
                Some(message) => log::error!("Login failed for {user_id}: {message}"),
                None => log::error!("Login failed for {user_id}"),
            }
            return Ok(None);
        }
        log::debug!("Login successful");

        let investigations = self
            .load_investigation_list(&pages.investigations, &pages.investigation)
            .await?;
        for investigation in &investigations {
            log::debug!("{investigation:?}");
        }
        Ok(Some(investigations))
    }

    /// Submits the login form once.
    ///
    /// The login succeeded if the site landed on the configured success
    /// page; otherwise the text of the error element, if any, is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the page or its controls are missing, the
    /// navigation fails, or the success URL is not a URL.
    pub async fn login(
        &mut self,
        config: &LoginPageConfig,
        user_id: &str,
        password: &str,
    ) -> Result<LoginOutcome, ReportError> {
        let landing = config.landing_url()?;

        log::debug!("Attempting site login at {}", config.page_uri);
        let page = self.session.fetch(&config.page_uri).await?;
        log::debug!("Login page title: {}", page.title());

        let mut form = page.form_by_name(&config.form_name)?.clone();
        form.set_value(&config.input_user_id, user_id)?;
        form.set_value(&config.input_password, password)?;
        if form.field(&config.input_submit).is_none() {
            return Err(BrowserError::not_found("field", &config.input_submit).into());
        }
        log::debug!("Entered credentials for {user_id}");

        let result = self
            .session
            .submit(&page, &form, Some(&config.input_submit))
            .await?;
        log::debug!("Result page: {} ({})", result.title(), result.url());

        if *result.url() == landing {
            return Ok(LoginOutcome::LoggedIn);
        }
        let message = result
            .element_by_id(&config.input_errors)
            .map(|errors| strip_cell_content(errors.text()))
            .filter(|message| !message.is_empty());
        Ok(LoginOutcome::Rejected { message })
    }

    /// Reads every page of the investigations list, opening each
    /// investigation in turn.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on the first navigation failure, missing
    /// element, unreadable value or mismatched investigation id.
    pub async fn load_investigation_list(
        &mut self,
        list: &ListPageConfig,
        detail: &DetailPageConfig,
    ) -> Result<InvestigationSet, ReportError> {
        log::debug!("Loading investigations from {}", list.page_uri);
        let page = self.session.fetch(&list.page_uri).await?;
        let page = self.open_tab(&page, list).await?;
        log::debug!("Tab state: {}", tab_state(&page, list));

        let name = page
            .element_by_id(&list.span_name)
            .map(|e| strip_cell_content(e.text()))
            .ok_or_else(|| BrowserError::not_found("element", &list.span_name))?;
        log::debug!("Logged in as {name}");

        let expected = page
            .elements_by_tag_and_class("div", &list.results_class)
            .next()
            .and_then(|div| parse_total_count(div.text()));
        match expected {
            Some(total) => {
                log::info!("Expecting {total} investigations");
                self.progress.set_total(total);
            }
            None => log::warn!("Investigation count unavailable"),
        }

        let page = self
            .session
            .select_option(&page, &list.input_page_size, &list.page_size)
            .await?;
        let mut page = self.reset_view(page, list).await?;

        let capacity = expected.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
        let mut investigations = Vec::with_capacity(capacity);
        let mut page_number = 1_usize;
        loop {
            log::info!("Loading page {page_number}");
            self.progress.set_message(format!("Page {page_number}"));
            self.extract_page(&page, list, detail, &mut investigations)
                .await?;

            match find_and_click_anchor(&mut self.session, &page, &list.link_next_page).await? {
                Some(next) => {
                    page = next;
                    page_number += 1;
                }
                None => break,
            }
        }

        log::info!(
            "Found {} investigations on {page_number} pages",
            investigations.len()
        );
        self.progress
            .finish(format!("{} investigations", investigations.len()));
        Ok(InvestigationSet::new(name, investigations))
    }

    /// Reads the investigation rows of one list page, appending each to
    /// `out` after its detail page has been read.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on the first failure; the investigation being
    /// read is not appended.
    pub async fn extract_page(
        &mut self,
        page: &Page,
        list: &ListPageConfig,
        detail: &DetailPageConfig,
        out: &mut Vec<Investigation>,
    ) -> Result<(), ReportError> {
        let table = page.table_by_id(&list.table)?;
        log::debug!("Investigation table has {} rows", table.rows().len());

        for (index, row) in table.rows().iter().enumerate().skip(HEADER_ROWS) {
            if row.attribute("class") != list.table_row_class {
                log::trace!("Skipping row {index} ({})", row.attribute("class"));
                continue;
            }

            let mut investigation = read_list_row(table, index)?;
            let detail_page = self.open_investigation(page, list, index).await?;
            let read = read_investigation(&detail_page, &mut investigation, list, detail);
            self.session.discard(detail_page);
            read?;

            log::debug!("Added investigation {}", investigation.id);
            out.push(investigation);
            self.progress.inc(1);
        }
        Ok(())
    }

    async fn open_tab(&mut self, page: &Page, list: &ListPageConfig) -> Result<Page, ReportError> {
        let anchor = page
            .anchor_by_text(&list.link_tab)
            .ok_or_else(|| BrowserError::not_found("anchor", &list.link_tab))?;
        Ok(self.session.click_anchor(page, anchor).await?)
    }

    /// The list only honors the page size after a row has been viewed, so
    /// view the first row and come back to the list tab.
    async fn reset_view(&mut self, page: Page, list: &ListPageConfig) -> Result<Page, ReportError> {
        if page.table_by_id(&list.table)?.rows().len() <= RESET_ROW {
            log::warn!("No investigation rows; skipping list view reset");
            return Ok(page);
        }
        let view = self.session.click_row(&page, &list.table, RESET_ROW).await?;
        let page = self.open_tab(&view, list).await?;
        self.session.discard(view);
        Ok(page)
    }

    async fn open_investigation(
        &mut self,
        page: &Page,
        list: &ListPageConfig,
        index: usize,
    ) -> Result<Page, ReportError> {
        let target = list.target_value(index + TARGET_ROW_OFFSET);
        let mut form = page.form_by_name(&list.form_name)?.clone();
        form.set_value(&list.form_input_target, &target)?;
        form.set_value(&list.form_input_argument, &list.form_input_argument_value)?;
        log::debug!(
            "Opening row {index}: target={target} argument={}",
            list.form_input_argument_value
        );
        Ok(self.session.submit(page, &form, None).await?)
    }
}

impl<S: BrowserSession> Drop for Reporter<S> {
    fn drop(&mut self) {
        self.session.release();
    }
}

fn tab_state<'a>(page: &'a Page, list: &ListPageConfig) -> &'a str {
    page.form_by_name(&list.form_name)
        .ok()
        .and_then(|form| form.field(&list.form_input_state))
        .map_or("<none>", Field::value)
}

fn cell_text(table: &Table, row: usize, column: usize) -> Result<&str, ReportError> {
    table
        .rows()
        .get(row)
        .and_then(|r| r.cell(column))
        .map(Cell::text)
        .ok_or_else(|| ReportError::MissingCell {
            table: table.id().unwrap_or_default().to_owned(),
            row,
            column,
        })
}

fn read_list_row(table: &Table, row: usize) -> Result<Investigation, ReportError> {
    let text = |column| cell_text(table, row, column).map(strip_cell_content);

    let mut investigation = Investigation {
        id: cell_as_number(cell_text(table, row, list::ID)?),
        entered_by: text(list::ENTERED_BY)?,
        subject: text(list::SUBJECT)?,
        event_rel: text(list::EVENT_REL)?,
        event_type: text(list::EVENT_TYPE)?,
        city: text(list::CITY)?,
        country: text(list::COUNTRY)?,
        status: text(list::STATUS)?,
        resolution: text(list::RESOLUTION)?,
        ..Investigation::default()
    };
    investigation.add_infraction(text(list::INFRACTION)?);
    Ok(investigation)
}

fn read_investigation(
    page: &Page,
    investigation: &mut Investigation,
    list: &ListPageConfig,
    detail: &DetailPageConfig,
) -> Result<(), ReportError> {
    log::debug!(
        "Investigation page: {} (tab state {}, view tab {})",
        page.title(),
        tab_state(page, list),
        list.view_tab
    );

    let table = page.table_by_id(&detail.summary_table)?;
    let datum = |row| cell_text(table, row, summary::COLUMN);

    let detail_id = cell_as_number(datum(summary::ID)?);
    if detail_id != investigation.id {
        return Err(ReportError::IdMismatch {
            list_id: investigation.id,
            detail_id,
        });
    }

    let date_pattern = &list.table_date_regex;
    let date_format = &list.table_date_format;
    investigation.incident_date =
        cell_as_date(datum(summary::INCIDENT_DATE)?, date_pattern, date_format)?;
    investigation.entered_date =
        cell_as_date(datum(summary::ENTERED_DATE)?, date_pattern, date_format)?;
    investigation.sanctioning_number = decode_key_value(
        &strip_cell_content(datum(summary::SANCTIONING_NUMBER)?),
        &detail.key_value_pattern,
    )?;
    investigation.entered_by_dci_number = cell_as_number(datum(summary::ENTERED_BY_DCI_NUMBER)?);
    investigation.subject_dci_number = cell_as_number(datum(summary::SUBJECT_DCI_NUMBER)?);
    investigation.subject_role = decode_key_value(
        &strip_cell_content(datum(summary::SUBJECT_ROLE)?),
        &detail.key_value_pattern,
    )?;

    let witnesses = page.table_by_id(&detail.witness_table)?;
    for row in HEADER_ROWS..witnesses.rows().len() {
        investigation.witnesses.push(Witness::new(
            strip_cell_content(cell_text(witnesses, row, witness::NAME)?),
            cell_as_number(cell_text(witnesses, row, witness::DCI_NUMBER)?),
            strip_cell_content(cell_text(witnesses, row, witness::ROLE)?),
        ));
    }

    let infractions = page.table_by_id(&detail.infraction_table)?;
    for row in HEADER_ROWS..infractions.rows().len() {
        investigation.add_infraction(strip_cell_content(cell_text(
            infractions,
            row,
            infraction::LABEL,
        )?));
    }

    let statements = page.table_by_id(&detail.statement_table)?;
    for row in HEADER_ROWS..statements.rows().len() {
        let statement = read_statement(statements, row, list, detail)?;
        if investigation.add_statement(statement).is_none() {
            log::debug!("Statement row {row} matches no witness");
        }
    }

    Ok(())
}

fn read_statement(
    table: &Table,
    row: usize,
    list: &ListPageConfig,
    detail: &DetailPageConfig,
) -> Result<Statement, ReportError> {
    let info = strip_cell_content(cell_text(table, row, statement::INFO)?);
    log::trace!("Statement info: {info:?}");

    let lines: Vec<&str> = info
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let line = |line: usize| {
        lines
            .get(line)
            .copied()
            .ok_or(ReportError::MissingLine { row, line })
    };

    let witness_name = strip_cell_content(line(statement::WITNESS_NAME_LINE)?);
    let entered_by = strip_cell_content(
        decode_key_value(line(statement::ENTERED_BY_LINE)?, &detail.key_value_pattern)?.as_str(),
    );

    Ok(Statement {
        witness_name,
        entered_by,
        entered_date: cell_as_date(&info, &list.table_date_regex, &list.table_date_format)?,
        statement: strip_cell_content(cell_text(table, row, statement::BODY)?),
        ..Statement::default()
    })
}
