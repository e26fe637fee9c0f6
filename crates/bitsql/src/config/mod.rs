//! Module: config
//! Responsibility: connection-string parsing into a typed `ConnectionConfig`.
//! Does not own: credential exchange (see `auth`) or request sending.
//! Boundary: everything a connection needs is decided here, before any I/O.

#[cfg(test)]
mod tests;

use crate::auth::Auth;
use bitsql_core::{ExecutorConfig, FilterDialect};
use derive_more::Display;
use percent_encoding::percent_decode_str;
use std::time::Duration;
use thiserror::Error as ThisError;
use url::Url;

/// Scheme every connection URL starts with (optionally `bitable+<driver>`).
pub const URL_SCHEME: &str = "bitable";

/// Open-API host used when a caller names none.
pub const DEFAULT_HOST: &str = "open.feishu.cn";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid connection URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme '{0}', expected '{URL_SCHEME}' or '{URL_SCHEME}+<driver>'")]
    Scheme(String),

    #[error("connection URL has no host")]
    MissingHost,

    #[error("connection URL has no app token path segment")]
    MissingAppToken,

    #[error("connection URL carries no credentials")]
    MissingCredentials,

    #[error("invalid value '{value}' for option '{key}'")]
    InvalidOption { key: String, value: String },

    #[error("unknown connection option '{0}'")]
    UnknownOption(String),
}

impl From<ConfigError> for bitsql_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

///
/// HttpScheme
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum HttpScheme {
    #[default]
    #[display("https")]
    Https,
    #[display("http")]
    Http,
}

///
/// ConnectionConfig
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: Option<u16>,
    pub scheme: HttpScheme,
    pub app_token: String,
    pub auth: Auth,
    pub executor: ExecutorConfig,
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, app_token: impl Into<String>, auth: Auth) -> Self {
        Self {
            host: host.into(),
            port: None,
            scheme: HttpScheme::default(),
            app_token: app_token.into(),
            auth,
            executor: ExecutorConfig::default(),
            timeout: None,
        }
    }

    /// Parse a connection URL.
    ///
    /// `bitable://<app_id>:<app_secret>@<host>/<app_token>` uses app
    /// credentials; `bitable://<personal_base_token>@<host>/<app_token>` (or
    /// the token in the password slot) a personal token. Query options:
    /// `page_size`, `max_limit`, `filter`, `timeout` (seconds), `scheme`.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(input)?;

        let scheme = url.scheme();
        if scheme != URL_SCHEME && !scheme.starts_with("bitable+") {
            return Err(ConfigError::Scheme(scheme.to_string()));
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or(ConfigError::MissingHost)?;

        let app_token = url.path().trim_matches('/');
        if app_token.is_empty() || app_token.contains('/') {
            return Err(ConfigError::MissingAppToken);
        }

        let username = decode_component(url.username());
        let password = decode_component(url.password().unwrap_or_default());
        let auth = match (username.as_str(), password.as_str()) {
            ("", "") => return Err(ConfigError::MissingCredentials),
            (token, "") | ("", token) => Auth::PersonalToken(token.to_string()),
            (app_id, app_secret) => Auth::AppCredentials {
                app_id: app_id.to_string(),
                app_secret: app_secret.to_string(),
            },
        };

        let mut config = Self::new(host, app_token, auth);
        config.port = url.port();

        for (key, value) in url.query_pairs() {
            config.apply_option(&key, &value)?;
        }

        Ok(config)
    }

    fn apply_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "page_size" => {
                let size = value.parse::<u32>().map_err(|_| invalid())?;
                if size == 0 || size > bitsql_core::config::DEFAULT_PAGE_SIZE {
                    return Err(invalid());
                }
                self.executor = self.executor.with_page_size(size);
            }
            "max_limit" => {
                let limit = value.parse::<u64>().map_err(|_| invalid())?;
                self.executor = self.executor.with_max_limit(limit);
            }
            "filter" => {
                let dialect = FilterDialect::from_name(value).ok_or_else(invalid)?;
                self.executor = self.executor.with_filter_dialect(dialect);
            }
            "timeout" => {
                let secs = value.parse::<u64>().map_err(|_| invalid())?;
                self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            "scheme" => {
                self.scheme = match value {
                    "https" => HttpScheme::Https,
                    "http" => HttpScheme::Http,
                    _ => return Err(invalid()),
                };
            }
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }

        Ok(())
    }

    /// `scheme://host[:port]`, with no trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }
}

// Userinfo comes back percent-encoded from `Url`; secrets may contain `/`,
// `@` or `:` that callers had to escape.
fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
