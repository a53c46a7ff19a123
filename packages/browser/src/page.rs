//! Immutable snapshots of a rendered page.
//!
//! A [`Page`] is parsed once from the HTML returned by a navigation and
//! holds everything the workflow reads from it: forms and their fields,
//! tables and their rows, anchors, and any element carrying an `id`,
//! `class` or `name`. Snapshots own plain strings, so they can be held
//! across `.await` points and cloned freely; changing a field value means
//! cloning the [`Form`] and handing it back to a
//! [`BrowserSession`](crate::BrowserSession).

use std::collections::BTreeMap;

use reqwest::Url;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use strum_macros::EnumString;

use crate::BrowserError;

/// The kind of a form control, derived from its tag and `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FieldKind {
    /// `<input type="text">` and inputs without a type.
    Text,
    /// `<input type="password">`.
    Password,
    /// `<input type="hidden">`.
    Hidden,
    /// `<input type="submit">` or `<button type="submit">`.
    Submit,
    /// `<input type="button">`.
    Button,
    /// `<input type="image">`.
    Image,
    /// `<input type="reset">`.
    Reset,
    /// `<input type="checkbox">`.
    Checkbox,
    /// `<input type="radio">`.
    Radio,
    /// `<select>`.
    Select,
    /// `<textarea>`.
    Textarea,
    /// Any other input type (`email`, `number`, ...), submitted like text.
    #[strum(default)]
    Other(String),
}

impl FieldKind {
    /// Whether this control is only sent when it is the one activated.
    #[must_use]
    pub const fn is_button(&self) -> bool {
        matches!(self, Self::Submit | Self::Button | Self::Image | Self::Reset)
    }
}

/// A named control inside a [`Form`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: String,
    kind: FieldKind,
    checked: bool,
    options: Vec<String>,
    onchange: Option<String>,
}

impl Field {
    /// Control name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Control kind.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Option values of a `<select>`; empty for other controls.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The `onchange` script, if any.
    #[must_use]
    pub fn onchange(&self) -> Option<&str> {
        self.onchange.as_deref()
    }

    /// Whether the control takes part in a submission that was not
    /// triggered by it.
    fn is_successful(&self) -> bool {
        if self.name.is_empty() || self.kind.is_button() {
            return false;
        }
        match self.kind {
            FieldKind::Checkbox | FieldKind::Radio => self.checked,
            _ => true,
        }
    }
}

/// A `<form>` and its controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    name: String,
    action: String,
    method: String,
    fields: Vec<Field>,
}

impl Form {
    /// The form's `name`, falling back to its `id`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw `action` attribute; empty means the page's own URL.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether the form submits with `GET`.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("get")
    }

    /// All controls in document order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a control by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sets the value of an existing control.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::NotFound`] if the form has no control called
    /// `name`.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<(), BrowserError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| BrowserError::not_found("field", name))?;
        value.clone_into(&mut field.value);
        Ok(())
    }

    /// Sets a control's value, adding a hidden control if it is missing.
    pub fn set_hidden(&mut self, name: &str, value: &str) {
        if self.set_value(name, value).is_err() {
            self.fields.push(Field {
                name: name.to_owned(),
                value: value.to_owned(),
                kind: FieldKind::Hidden,
                checked: false,
                options: Vec::new(),
                onchange: None,
            });
        }
    }

    /// Name/value pairs sent when the form is submitted.
    ///
    /// Buttons are skipped unless `control` names the one that was
    /// activated; unchecked checkboxes and radios are skipped.
    #[must_use]
    pub fn submission(&self, control: Option<&str>) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|f| f.is_successful() || control.is_some_and(|c| c == f.name))
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
}

impl Cell {
    /// Text content of the cell, with `<br>` rendered as a newline.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A `<tr>` of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    attributes: BTreeMap<String, String>,
    cells: Vec<Cell>,
}

impl Row {
    /// The cell at `index`, counting `<td>` and `<th>` alike.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// All cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// An attribute value, or `""` when absent.
    #[must_use]
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes.get(name).map_or("", String::as_str)
    }
}

/// A `<table>` and the rows that belong to it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    id: Option<String>,
    rows: Vec<Row>,
}

impl Table {
    /// The table's `id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Rows in document order, excluding rows of nested tables.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// An `<a>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    id: Option<String>,
    text: String,
    href: Option<String>,
    onclick: Option<String>,
}

impl Anchor {
    /// The anchor's `id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Trimmed text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The raw `href`.
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// The `onclick` script, if any.
    #[must_use]
    pub fn onclick(&self) -> Option<&str> {
        self.onclick.as_deref()
    }
}

/// Any element that carries an `id`, `class` or `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
}

impl Element {
    /// Lower-case tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// An attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

/// A parsed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    url: Url,
    title: String,
    forms: Vec<Form>,
    tables: Vec<Table>,
    anchors: Vec<Anchor>,
    elements: Vec<Element>,
}

impl Page {
    /// Parses `html` served from `url`.
    #[must_use]
    pub fn parse(url: Url, html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&selector("title"))
            .next()
            .map(|t| text_content(t).trim().to_owned())
            .unwrap_or_default();

        let forms = document.select(&selector("form")).map(parse_form).collect();

        let tables = document
            .select(&selector("table"))
            .map(parse_table)
            .collect();

        let anchors = document
            .select(&selector("a"))
            .map(|a| Anchor {
                id: a.value().attr("id").map(str::to_owned),
                text: text_content(a).trim().to_owned(),
                href: a.value().attr("href").map(str::to_owned),
                onclick: a.value().attr("onclick").map(str::to_owned),
            })
            .collect();

        let elements = document
            .select(&selector("[id], [class], [name]"))
            .map(|e| Element {
                tag: e.value().name().to_owned(),
                attributes: attributes(e),
                text: text_content(e),
            })
            .collect();

        Self {
            url,
            title,
            forms,
            tables,
            anchors,
            elements,
        }
    }

    /// The URL the page was served from, after redirects.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Trimmed `<title>` text.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All forms in document order.
    #[must_use]
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    /// Looks up a form by name (or id).
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::NotFound`] if no such form exists.
    pub fn form_by_name(&self, name: &str) -> Result<&Form, BrowserError> {
        self.forms
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| BrowserError::not_found("form", name))
    }

    /// The form that owns the control called `name`, if any.
    #[must_use]
    pub fn form_with_field(&self, name: &str) -> Option<&Form> {
        self.forms.iter().find(|f| f.field(name).is_some())
    }

    /// Looks up a table by id.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::NotFound`] if no such table exists.
    pub fn table_by_id(&self, id: &str) -> Result<&Table, BrowserError> {
        self.tables
            .iter()
            .find(|t| t.id() == Some(id))
            .ok_or_else(|| BrowserError::not_found("table", id))
    }

    /// The first anchor whose trimmed text is exactly `text`.
    #[must_use]
    pub fn anchor_by_text(&self, text: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.text == text)
    }

    /// The element with the given `id`.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.attribute("id") == Some(id))
    }

    /// Elements with tag `tag` whose class list contains `class`, in
    /// document order.
    pub fn elements_by_tag_and_class<'a>(
        &'a self,
        tag: &'a str,
        class: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.tag == tag && e.has_class(class))
    }

    /// Resolves `href` against the page URL.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::InvalidUrl`] if the result is not a valid URL.
    pub fn resolve(&self, href: &str) -> Result<Url, BrowserError> {
        self.url.join(href).map_err(|e| BrowserError::InvalidUrl {
            url: href.to_owned(),
            message: e.to_string(),
        })
    }

    /// Returns a copy of this page with the same-named form replaced.
    ///
    /// Used for control changes that do not navigate.
    #[must_use]
    pub fn with_form(&self, form: Form) -> Self {
        let mut page = self.clone();
        if let Some(existing) = page.forms.iter_mut().find(|f| f.name == form.name) {
            *existing = form;
        }
        page
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!())
}

fn attributes(element: ElementRef<'_>) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

/// Concatenated descendant text, with `<br>` rendered as `\n`.
fn text_content(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn parse_form(form: ElementRef<'_>) -> Form {
    let element = form.value();
    let name = element
        .attr("name")
        .or_else(|| element.attr("id"))
        .unwrap_or_default()
        .to_owned();

    let fields = form
        .select(&selector("input, select, textarea, button"))
        .filter_map(parse_field)
        .collect();

    Form {
        name,
        action: element.attr("action").unwrap_or_default().to_owned(),
        method: element.attr("method").unwrap_or("get").to_owned(),
        fields,
    }
}

fn parse_field(control: ElementRef<'_>) -> Option<Field> {
    let element = control.value();
    let name = element.attr("name")?.to_owned();
    let onchange = element.attr("onchange").map(str::to_owned);

    let field = match element.name() {
        "select" => {
            let options: Vec<(String, bool)> = control
                .select(&selector("option"))
                .map(|o| {
                    let value = o
                        .value()
                        .attr("value")
                        .map_or_else(|| text_content(o).trim().to_owned(), str::to_owned);
                    (value, o.value().attr("selected").is_some())
                })
                .collect();
            let value = options
                .iter()
                .find(|(_, selected)| *selected)
                .or_else(|| options.first())
                .map(|(v, _)| v.clone())
                .unwrap_or_default();
            Field {
                name,
                value,
                kind: FieldKind::Select,
                checked: false,
                options: options.into_iter().map(|(v, _)| v).collect(),
                onchange,
            }
        }
        "textarea" => Field {
            name,
            value: text_content(control),
            kind: FieldKind::Textarea,
            checked: false,
            options: Vec::new(),
            onchange,
        },
        tag => {
            let default_kind = if tag == "button" { "submit" } else { "text" };
            let kind = element
                .attr("type")
                .unwrap_or(default_kind)
                .parse()
                .unwrap_or(FieldKind::Text);
            let default_value = if matches!(kind, FieldKind::Checkbox | FieldKind::Radio) {
                "on"
            } else {
                ""
            };
            Field {
                name,
                value: element.attr("value").unwrap_or(default_value).to_owned(),
                checked: element.attr("checked").is_some(),
                kind,
                options: Vec::new(),
                onchange,
            }
        }
    };

    Some(field)
}

fn parse_table(table: ElementRef<'_>) -> Table {
    let table_id = table.id();

    let rows = table
        .select(&selector("tr"))
        .filter(|tr| {
            // Only rows whose nearest enclosing table is this one.
            tr.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
                .is_some_and(|a| a.id() == table_id)
        })
        .map(|tr| Row {
            attributes: attributes(tr),
            cells: tr
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .map(|c| Cell {
                    text: text_content(c),
                })
                .collect(),
        })
        .collect();

    Table {
        id: table.value().attr("id").map(str::to_owned),
        rows,
    }
}
