//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `SNOOZE_*` environment variables or a configuration file.
//! Unset fields fall back to the hosted API defaults.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::{LoginToken, StoredCredentials, Username};
use crate::outbound::hack_or_snooze::DEFAULT_USER_AGENT;

/// Hosted Hack-or-Snooze API.
pub const DEFAULT_BASE_URL: &str = "https://hack-or-snooze-v3.herokuapp.com";
/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Errors raised while loading or validating [`ClientSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be merged.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Loader diagnostic.
        message: String,
    },
    /// `base_url` did not parse as an absolute URL.
    #[error("invalid base url {value:?}: {message}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser diagnostic.
        message: String,
    },
    /// `base_url` used a scheme other than http or https.
    #[error("base url must use http or https, got {scheme:?}")]
    UnsupportedScheme {
        /// Scheme that was configured.
        scheme: String,
    },
    /// Only one of `token` and `username` was set.
    #[error("stored credentials need both token and username")]
    IncompleteCredentials,
    /// A stored credential value failed validation.
    #[error("invalid stored credentials: {message}")]
    InvalidCredentials {
        /// Validation diagnostic.
        message: String,
    },
}

/// Connection and session settings for the `snooze` client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SNOOZE")]
pub struct ClientSettings {
    /// API base URL.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 10)]
    pub timeout_seconds: u64,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Persisted login token.
    pub token: Option<String>,
    /// Username the persisted token belongs to.
    pub username: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: None,
            token: None,
            username: None,
        }
    }
}

impl ClientSettings {
    /// Load settings from the environment and configuration files only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source is malformed.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("snooze")]).map_err(|error| ConfigError::Load {
            message: error.to_string(),
        })
    }

    /// Return the validated base URL, falling back to the hosted API.
    ///
    /// # Errors
    ///
    /// Fails when the value does not parse or is not http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim();
        let url = Url::parse(raw).map_err(|error| ConfigError::InvalidBaseUrl {
            value: raw.to_owned(),
            message: error.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme {
                scheme: other.to_owned(),
            }),
        }
    }

    /// Return the request timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    /// Return the configured user agent, falling back to the crate default.
    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Return the persisted session, if one is configured.
    ///
    /// # Errors
    ///
    /// Fails when only half of the pair is set or a value is invalid.
    pub fn stored_credentials(&self) -> Result<Option<StoredCredentials>, ConfigError> {
        match (self.token.as_deref(), self.username.as_deref()) {
            (None, None) => Ok(None),
            (Some(token), Some(username)) => {
                let token = LoginToken::new(token).map_err(|error| {
                    ConfigError::InvalidCredentials {
                        message: error.to_string(),
                    }
                })?;
                let username = Username::new(username).map_err(|error| {
                    ConfigError::InvalidCredentials {
                        message: error.to_string(),
                    }
                })?;
                Ok(Some(StoredCredentials { token, username }))
            }
            _ => Err(ConfigError::IncompleteCredentials),
        }
    }
}
