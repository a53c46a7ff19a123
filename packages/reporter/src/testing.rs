//! In-memory Judge Center for workflow tests.
//!
//! [`FakeSession`] answers each navigation through a router closure and
//! journals what was asked of it. [`Site`] is a router that renders login,
//! list and investigation pages shaped like the real ones from the embedded
//! page layout.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use judge_center_browser::{Anchor, BrowserError, BrowserSession, Form, Page, Url};

use crate::config::PageConfig;
use crate::layout::{RESET_ROW, TARGET_ROW_OFFSET};
use crate::progress::ProgressCallback;

pub const USER_ID: &str = "4021";
pub const PASSWORD: &str = "hunter2";
pub const USER_NAME: &str = "Jane Judge";

const HOME_URL: &str = "https://judge.wizards.com/default.aspx";
const LIST_URL: &str = "https://judge.wizards.com/investigations.aspx";

/// A navigation requested of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Fetch {
        url: String,
    },
    Submit {
        from: String,
        form: String,
        control: Option<String>,
        fields: BTreeMap<String, String>,
    },
    Anchor {
        from: String,
        text: String,
    },
    Row {
        from: String,
        table: String,
        index: usize,
    },
    Select {
        from: String,
        name: String,
        value: String,
    },
}

impl Action {
    /// URL of the page the action started from.
    pub fn from_url(&self) -> Option<&str> {
        match self {
            Self::Fetch { .. } => None,
            Self::Submit { from, .. }
            | Self::Anchor { from, .. }
            | Self::Row { from, .. }
            | Self::Select { from, .. } => Some(from),
        }
    }
}

/// Everything the session was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub actions: Vec<Action>,
    pub discarded: Vec<String>,
    pub released: bool,
}

impl Journal {
    pub fn detail_requests(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Submit { control: None, .. }))
            .count()
    }

    pub fn anchor_clicks(&self, text: &str) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Anchor { text: t, .. } if t == text))
            .count()
    }
}

type Router = Box<dyn FnMut(&Action) -> Option<(String, String)> + Send>;

/// A browser session over a router closure returning `(url, html)`.
pub struct FakeSession {
    router: Router,
    journal: Arc<Mutex<Journal>>,
    released: bool,
}

impl FakeSession {
    pub fn new(
        router: impl FnMut(&Action) -> Option<(String, String)> + Send + 'static,
    ) -> (Self, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let session = Self {
            router: Box::new(router),
            journal: Arc::clone(&journal),
            released: false,
        };
        (session, journal)
    }

    fn navigate(&mut self, action: Action) -> Result<Page, BrowserError> {
        if self.released {
            return Err(BrowserError::Released);
        }
        let route = (self.router)(&action);
        let key = format!("{action:?}");
        self.journal.lock().unwrap().actions.push(action);

        let (url, html) = route.ok_or_else(|| BrowserError::not_found("route", key))?;
        Ok(Page::parse(Url::parse(&url).unwrap(), &html))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn fetch(&mut self, url: &str) -> Result<Page, BrowserError> {
        self.navigate(Action::Fetch {
            url: url.to_string(),
        })
    }

    async fn submit(
        &mut self,
        page: &Page,
        form: &Form,
        control: Option<&str>,
    ) -> Result<Page, BrowserError> {
        self.navigate(Action::Submit {
            from: page.url().to_string(),
            form: form.name().to_string(),
            control: control.map(str::to_string),
            fields: form.submission(control).into_iter().collect(),
        })
    }

    async fn click_anchor(&mut self, page: &Page, anchor: &Anchor) -> Result<Page, BrowserError> {
        self.navigate(Action::Anchor {
            from: page.url().to_string(),
            text: anchor.text().to_string(),
        })
    }

    async fn click_row(
        &mut self,
        page: &Page,
        table_id: &str,
        index: usize,
    ) -> Result<Page, BrowserError> {
        page.table_by_id(table_id)?
            .rows()
            .get(index)
            .ok_or_else(|| BrowserError::not_found("row", index.to_string()))?;
        self.navigate(Action::Row {
            from: page.url().to_string(),
            table: table_id.to_string(),
            index,
        })
    }

    async fn select_option(
        &mut self,
        page: &Page,
        name: &str,
        value: &str,
    ) -> Result<Page, BrowserError> {
        self.navigate(Action::Select {
            from: page.url().to_string(),
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn discard(&mut self, page: Page) {
        self.journal
            .lock()
            .unwrap()
            .discarded
            .push(page.url().to_string());
    }

    fn release(&mut self) {
        self.released = true;
        self.journal.lock().unwrap().released = true;
    }
}

/// Counts progress updates.
#[derive(Default)]
pub struct RecordingProgress {
    pub total: Mutex<Option<u64>>,
    pub count: AtomicU64,
}

impl ProgressCallback for RecordingProgress {
    fn set_total(&self, total: u64) {
        *self.total.lock().unwrap() = Some(total);
    }

    fn inc(&self, delta: u64) {
        self.count.fetch_add(delta, Ordering::SeqCst);
    }

    fn set_message(&self, _msg: String) {}

    fn finish(&self, _msg: String) {}
}

/// The investigation page opened from a list row.
#[derive(Debug, Clone)]
pub struct Detail {
    pub summary: Vec<String>,
    pub witnesses: Vec<[String; 3]>,
    pub infractions: Vec<String>,
    /// `(info cell html, body)` pairs.
    pub statements: Vec<(String, String)>,
}

impl Detail {
    pub fn new(id: i64) -> Self {
        Self {
            summary: vec![
                id.to_string(),
                "Incident Date: 3/1/2015".to_string(),
                "Entered: 3/2/2015 9:15 AM".to_string(),
                "Sanctioning Number: 12-34-5678".to_string(),
                "Entered By: Sam Entered".to_string(),
                "DCI #: 1001".to_string(),
                "Subject: Pat Subject".to_string(),
                "DCI #:&nbsp;2002".to_string(),
                "Role: Player".to_string(),
            ],
            witnesses: Vec::new(),
            infractions: Vec::new(),
            statements: Vec::new(),
        }
    }

    pub fn witness(mut self, name: &str, dci_number: &str, role: &str) -> Self {
        self.witnesses
            .push([name.to_string(), dci_number.to_string(), role.to_string()]);
        self
    }

    pub fn infraction(mut self, label: &str) -> Self {
        self.infractions.push(label.to_string());
        self
    }

    pub fn statement(mut self, info: &str, body: &str) -> Self {
        self.statements.push((info.to_string(), body.to_string()));
        self
    }

    fn html(&self, pages: &PageConfig) -> String {
        let detail = &pages.investigation;
        let mut html = String::from(
            "<html><head><title>Investigation</title></head><body>\
             <form name=\"aspnetForm\" method=\"post\" action=\"investigations.aspx\">\
             <input type=\"hidden\" name=\"__EVENTTARGET\" value=\"\" />\
             <input type=\"hidden\" name=\"__EVENTARGUMENT\" value=\"\" />",
        );
        let _ = write!(
            html,
            "<input type=\"hidden\" name=\"{}\" value=\"{}\" />",
            pages.investigations.form_input_state, pages.investigations.view_tab
        );
        let _ = write!(
            html,
            "<a href=\"javascript:__doPostBack('tabSelect','')\">{}</a>",
            pages.investigations.link_tab
        );

        let _ = write!(html, "<table id=\"{}\">", detail.summary_table);
        for value in &self.summary {
            let _ = write!(
                html,
                "<tr><td class=\"{}\">{value}</td></tr>",
                detail.summary_datum_class
            );
        }
        html.push_str("</table>");

        let _ = write!(
            html,
            "<table id=\"{}\"><tr><th>Name</th><th>DCI</th><th>Role</th></tr>",
            detail.witness_table
        );
        for [name, dci_number, role] in &self.witnesses {
            let _ = write!(
                html,
                "<tr><td>{name}</td><td>{dci_number}</td><td>{role}</td></tr>"
            );
        }
        html.push_str("</table>");

        let _ = write!(
            html,
            "<table id=\"{}\"><tr><th>Infraction</th></tr>",
            detail.infraction_table
        );
        for label in &self.infractions {
            let _ = write!(html, "<tr><td>&nbsp;{label}</td></tr>");
        }
        html.push_str("</table>");

        let _ = write!(
            html,
            "<table id=\"{}\"><tr><th></th><th>Info</th><th>Statement</th></tr>",
            detail.statement_table
        );
        for (info, body) in &self.statements {
            let _ = write!(
                html,
                "<tr><td><img src=\"s.gif\" /></td><td>{info}</td><td>{body}</td></tr>"
            );
        }
        html.push_str("</table></form></body></html>");
        html
    }
}

/// A row of the investigations list.
#[derive(Debug, Clone)]
pub struct ListRow {
    pub class: String,
    pub cells: Vec<String>,
    pub detail: Detail,
}

impl ListRow {
    pub fn new(id: i64) -> Self {
        Self {
            class: "gridRow".to_string(),
            cells: vec![
                id.to_string(),
                "<input type=\"checkbox\" />".to_string(),
                "3/2/2015".to_string(),
                "&nbsp;Sam Entered".to_string(),
                "Pat Subject".to_string(),
                "Competitive".to_string(),
                "Grand Prix".to_string(),
                "Seattle".to_string(),
                "United States".to_string(),
                "Cheating".to_string(),
                "Closed".to_string(),
                "Suspended %".to_string(),
            ],
            detail: Detail::new(id),
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }
}

/// A Judge Center with a fixed list of investigations split into pages.
#[derive(Debug, Clone)]
pub struct Site {
    pub pages: PageConfig,
    pub list_pages: Vec<Vec<ListRow>>,
    pub results: Option<String>,
}

impl Site {
    pub fn new(list_pages: Vec<Vec<ListRow>>) -> Self {
        let total: usize = list_pages.iter().map(Vec::len).sum();
        Self {
            pages: PageConfig::embedded(),
            list_pages,
            results: Some(format!("Showing investigations 1 - {total} of {total}.")),
        }
    }

    pub fn session(self) -> (FakeSession, Arc<Mutex<Journal>>) {
        FakeSession::new(move |action| self.route(action))
    }

    fn route(&self, action: &Action) -> Option<(String, String)> {
        let login = &self.pages.login;
        let list = &self.pages.investigations;

        match action {
            Action::Fetch { url } if *url == login.page_uri => {
                Some((login.page_uri.clone(), self.login_html(false)))
            }
            Action::Fetch { url } if *url == list.page_uri => {
                Some((list.page_uri.clone(), self.list_html(0)))
            }
            Action::Submit {
                control: Some(control),
                fields,
                ..
            } if *control == login.input_submit => {
                let accepted = fields.get(&login.input_user_id).map(String::as_str)
                    == Some(USER_ID)
                    && fields.get(&login.input_password).map(String::as_str) == Some(PASSWORD);
                if accepted {
                    Some((
                        HOME_URL.to_string(),
                        "<html><head><title>Judge Center</title></head></html>".to_string(),
                    ))
                } else {
                    Some((login.page_uri.clone(), self.login_html(true)))
                }
            }
            Action::Anchor { text, .. } if *text == list.link_tab => {
                Some((page_url(0), self.list_html(0)))
            }
            Action::Select { name, value, .. }
                if *name == list.input_page_size && *value == list.page_size =>
            {
                Some((page_url(0), self.list_html(0)))
            }
            Action::Row { table, index, .. } if *table == list.table && *index == RESET_ROW => {
                let first = self.list_pages.first()?.first()?;
                Some((
                    format!("{LIST_URL}?view=reset"),
                    first.detail.html(&self.pages),
                ))
            }
            Action::Anchor { from, text } if *text == list.link_next_page => {
                let next = page_index(from)? + 1;
                (next < self.list_pages.len()).then(|| (page_url(next), self.list_html(next)))
            }
            Action::Submit {
                from,
                control: None,
                fields,
                ..
            } => {
                if fields.get(&list.form_input_argument) != Some(&list.form_input_argument_value) {
                    return None;
                }
                let target = fields.get(&list.form_input_target)?;
                let rows = self.list_pages.get(page_index(from)?)?;
                let (index, row) = rows
                    .iter()
                    .enumerate()
                    .find(|(i, _)| list.target_value(i + 1 + TARGET_ROW_OFFSET) == *target)?;
                Some((
                    format!("{LIST_URL}?view={index}"),
                    row.detail.html(&self.pages),
                ))
            }
            _ => None,
        }
    }

    fn login_html(&self, failed: bool) -> String {
        let login = &self.pages.login;
        let errors = if failed {
            format!(
                "<span id=\"{}\">Invalid DCI number or password.</span>",
                login.input_errors
            )
        } else {
            String::new()
        };
        format!(
            "<html><head><title>Judge Center Login</title></head><body>\
             <form name=\"{}\" method=\"post\" action=\"login.aspx\">\
             <input type=\"hidden\" name=\"__VIEWSTATE\" value=\"dDwtMTA\" />\
             <input type=\"text\" name=\"{}\" />\
             <input type=\"password\" name=\"{}\" />\
             <input type=\"submit\" name=\"{}\" value=\"Log In\" />{errors}\
             </form></body></html>",
            login.form_name, login.input_user_id, login.input_password, login.input_submit
        )
    }

    pub fn list_html(&self, index: usize) -> String {
        let list = &self.pages.investigations;
        let mut html = format!(
            "<html><head><title>Investigations</title></head><body>\
             <form name=\"{}\" method=\"post\" action=\"investigations.aspx\">\
             <input type=\"hidden\" name=\"{}\" value=\"\" />\
             <input type=\"hidden\" name=\"{}\" value=\"\" />\
             <input type=\"hidden\" name=\"{}\" value=\"3\" />\
             <span id=\"{}\">{USER_NAME}</span>\
             <select name=\"{}\"><option value=\"10\" selected>10</option>\
             <option value=\"{}\">{}</option></select>\
             <a href=\"javascript:__doPostBack('tabSelect','')\">{}</a>",
            list.form_name,
            list.form_input_target,
            list.form_input_argument,
            list.form_input_state,
            list.span_name,
            list.input_page_size,
            list.page_size,
            list.page_size,
            list.link_tab,
        );
        if let Some(results) = &self.results {
            let _ = write!(html, "<div class=\"{}\">{results}</div>", list.results_class);
        }

        let _ = write!(
            html,
            "<table id=\"{}\"><tr class=\"gridHeader\"><th>Id</th></tr>",
            list.table
        );
        for row in self.list_pages.get(index).into_iter().flatten() {
            let _ = write!(html, "<tr class=\"{}\">", row.class);
            for cell in &row.cells {
                let _ = write!(html, "<td>{cell}</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");

        if index + 1 < self.list_pages.len() {
            let _ = write!(
                html,
                "<a href=\"javascript:__doPostBack('pager','Page$Next')\">{}</a>",
                list.link_next_page
            );
        }
        html.push_str("</form></body></html>");
        html
    }
}

fn page_url(index: usize) -> String {
    format!("{LIST_URL}?page={}", index + 1)
}

fn page_index(url: &str) -> Option<usize> {
    let (_, page) = url.rsplit_once("?page=")?;
    page.parse::<usize>().ok()?.checked_sub(1)
}
