//! Page layout configuration.
//!
//! Element names, ids, classes and patterns for the three Judge Center pages
//! the reporter reads. The default layout in `config/pages.toml` is baked
//! into the binary with [`include_str!`]; a replacement file can be loaded
//! with [`PageConfig::from_path`] when the site changes.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use judge_center_browser::Url;
use regex::Regex;
use serde::{Deserialize, Deserializer};

const EMBEDDED_PAGES: &str = include_str!("../config/pages.toml");

static TARGET_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{0(?::([0-9]+))?\}").unwrap_or_else(|_| unreachable!())
});

/// Errors loading a page configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The TOML was malformed, a field was missing or a pattern did not
    /// compile.
    #[error("Invalid page configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configured URL does not parse.
    #[error("Invalid URL '{url}' for {key}: {message}")]
    InvalidUrl {
        /// Configuration key.
        key: &'static str,
        /// The configured value.
        url: String,
        /// Parser message.
        message: String,
    },
}

/// The login page.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPageConfig {
    /// Address of the login page.
    pub page_uri: String,
    /// Name of the login form.
    pub form_name: String,
    /// Name of the user id input.
    pub input_user_id: String,
    /// Name of the password input.
    pub input_password: String,
    /// Name of the submit control.
    pub input_submit: String,
    /// Id of the element showing login errors.
    pub input_errors: String,
    /// Address the site lands on after a successful login.
    pub success_url: String,
}

impl LoginPageConfig {
    /// Parses [`Self::success_url`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if it is not a URL.
    pub fn landing_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.success_url).map_err(|e| ConfigError::InvalidUrl {
            key: "login.success_url",
            url: self.success_url.clone(),
            message: e.to_string(),
        })
    }
}

/// The investigations list (`select` tab).
#[derive(Debug, Clone, Deserialize)]
pub struct ListPageConfig {
    /// Address of the list page.
    pub page_uri: String,
    /// Name of the page form.
    pub form_name: String,
    /// Name of the hidden field holding the selected tab.
    pub form_input_state: String,
    /// Name of the postback target field.
    pub form_input_target: String,
    /// Postback target for a row. `{0}` is replaced by the row's control
    /// index; `{0:N}` zero-pads it to `N` digits.
    pub form_input_target_value: String,
    /// Name of the postback argument field.
    pub form_input_argument: String,
    /// Postback argument sent when opening a row.
    pub form_input_argument_value: String,
    /// Id of the element showing the logged-in user's name.
    pub span_name: String,
    /// Class of the `div` summarizing the result count.
    pub results_class: String,
    /// Name of the page size `<select>`.
    pub input_page_size: String,
    /// Page size option to select.
    pub page_size: String,
    /// Text of the link opening the `select` tab.
    pub link_tab: String,
    /// Text of the link to the next page.
    pub link_next_page: String,
    /// Tab state value of the `view` tab.
    pub view_tab: String,
    /// Id of the investigations table.
    pub table: String,
    /// Class of the table's investigation rows.
    pub table_row_class: String,
    /// Pattern whose first group holds a date.
    #[serde(deserialize_with = "regex")]
    pub table_date_regex: Regex,
    /// `chrono` format of the dates captured by `table_date_regex`.
    pub table_date_format: String,
}

impl ListPageConfig {
    /// Postback target for the row with control index `index`.
    #[must_use]
    pub fn target_value(&self, index: usize) -> String {
        TARGET_PLACEHOLDER
            .replace_all(&self.form_input_target_value, |caps: &regex::Captures<'_>| {
                let width = caps
                    .get(1)
                    .and_then(|w| w.as_str().parse::<usize>().ok())
                    .unwrap_or(0);
                format!("{index:0width$}")
            })
            .into_owned()
    }
}

/// An investigation (`view` tab).
#[derive(Debug, Clone, Deserialize)]
pub struct DetailPageConfig {
    /// Id of the summary table.
    pub summary_table: String,
    /// Class of the summary table's value cells.
    pub summary_datum_class: String,
    /// Id of the witness grid.
    pub witness_table: String,
    /// Id of the infraction grid.
    pub infraction_table: String,
    /// Id of the statement grid.
    pub statement_table: String,
    /// Pattern whose first group is the value of a `Key: Value` cell.
    #[serde(deserialize_with = "regex")]
    pub key_value_pattern: Regex,
}

/// Layout of every page the reporter reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    /// The login page.
    pub login: LoginPageConfig,
    /// The investigations list.
    pub investigations: ListPageConfig,
    /// A single investigation.
    pub investigation: DetailPageConfig,
}

impl PageConfig {
    /// The built-in layout.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `pages.toml` is invalid.
    #[must_use]
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_PAGES)
            .unwrap_or_else(|e| panic!("Failed to parse embedded pages.toml: {e}"))
    }

    /// Loads a layout file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let toml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded page layout from {}", path.display());
        Self::parse(&toml)
    }

    /// Parses a layout document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed, a pattern does not
    /// compile or the login landing URL is not a URL.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.login.landing_url()?;
        Ok(config)
    }
}

fn regex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_layout_parses() {
        let config = PageConfig::embedded();
        assert_eq!(config.login.form_name, "aspnetForm");
        assert_eq!(config.investigations.form_input_target, "__EVENTTARGET");
        assert!(config.investigations.table_date_regex.is_match("3/14/2015"));
        assert!(config.investigation.key_value_pattern.is_match("Role: Judge"));
    }

    #[test]
    fn target_value_fills_placeholder() {
        let mut list = PageConfig::embedded().investigations;

        list.form_input_target_value = "grid$ctl{0:2}".to_string();
        assert_eq!(list.target_value(3), "grid$ctl03");
        assert_eq!(list.target_value(12), "grid$ctl12");

        list.form_input_target_value = "grid$row{0}".to_string();
        assert_eq!(list.target_value(3), "grid$row3");
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let toml = EMBEDDED_PAGES.replace(r"^[^:]*:\s*(.*)$", "(unclosed");
        assert!(matches!(PageConfig::parse(&toml), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn bad_landing_url_is_rejected() {
        let toml = EMBEDDED_PAGES.replace(
            "https://judge.wizards.com/default.aspx",
            "not a url",
        );
        assert!(matches!(
            PageConfig::parse(&toml),
            Err(ConfigError::InvalidUrl { key: "login.success_url", .. })
        ));
    }

    #[test]
    fn missing_table_is_rejected() {
        let toml = "[login]\npage_uri = \"https://judge.example/\"\n";
        assert!(matches!(PageConfig::parse(toml), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = PageConfig::from_path(Path::new("/nonexistent/pages.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("Cannot read /nonexistent/pages.toml: "));
    }
}
