//! Login credentials from the command line, a TOML file or a prompt.

use std::fmt;
use std::path::{Path, PathBuf};

use dialoguer::{Input, Password};
use serde::Deserialize;

/// Errors obtaining credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// The credentials file exists but could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// Credentials file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not valid TOML or lacks a key.
    #[error("Invalid credentials file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The interactive prompt failed.
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// A Judge Center user id and password.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// DCI number used to log in.
    pub user_id: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"********")
            .finish()
    }
}

impl Credentials {
    /// Parses a credentials document with `user_id` and `password` keys.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Toml`] if either key is missing.
    pub fn parse(toml: &str) -> Result<Self, CredentialsError> {
        Ok(toml::from_str(toml)?)
    }

    /// Reads `path`, or returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Option<Self>, CredentialsError> {
        match std::fs::read_to_string(path) {
            Ok(toml) => Self::parse(&toml).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Resolves credentials in order: both command line arguments, the
    /// credentials file, then an interactive prompt for whatever is still
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] if the file is unreadable or the prompt
    /// fails.
    pub fn resolve(
        user_id: Option<String>,
        password: Option<String>,
        path: &Path,
    ) -> Result<Self, CredentialsError> {
        if let (Some(user_id), Some(password)) = (&user_id, &password) {
            return Ok(Self {
                user_id: user_id.clone(),
                password: password.clone(),
            });
        }

        if user_id.is_none() {
            if let Some(credentials) = Self::from_path(path)? {
                log::debug!("Using credentials from {}", path.display());
                return Ok(credentials);
            }
            log::debug!("No credentials file at {}", path.display());
        }

        let user_id = match user_id {
            Some(user_id) => user_id,
            None => Input::new().with_prompt("DCI number").interact_text()?,
        };
        let password = Password::new().with_prompt("Password").interact()?;
        Ok(Self { user_id, password })
    }
}
