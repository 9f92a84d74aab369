//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "http://localhost:3001/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_COOKIE_FILE: &str = ".libris/cookies";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{0}' (expected http:// or https://)")]
    InvalidApiBase(String),
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
    #[error("cannot locate cookie file: set LIBRIS_COOKIE_PATH or HOME")]
    MissingCookiePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash, e.g. `http://localhost:3001/api`.
    pub api_base: String,
    pub timeouts: HttpTimeouts,
    /// Whether the persisted auth cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// File backing the persisted auth cookie.
    pub cookie_path: PathBuf,
    pub keepalive_interval_secs: u64,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `LIBRIS_API_BASE`: default `http://localhost:3001/api`
    /// - `LIBRIS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LIBRIS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LIBRIS_COOKIE_SECURE`: `true`/`false`, default false
    /// - `LIBRIS_COOKIE_PATH`: default `$HOME/.libris/cookies`
    /// - `LIBRIS_KEEPALIVE_INTERVAL_SECS`: default 600
    ///
    /// # Errors
    ///
    /// Returns an error if the API base is not an HTTP(S) URL, a flag or a
    /// duration is malformed (durations must be positive), or no cookie
    /// location can be derived.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base = parse_api_base(std::env::var("LIBRIS_API_BASE").ok().as_deref())?;
        let timeouts = HttpTimeouts {
            request_secs: env_parse_secs("LIBRIS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("LIBRIS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let cookie_secure = match std::env::var("LIBRIS_COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue { var: "LIBRIS_COOKIE_SECURE", value: raw })?,
            Err(_) => false,
        };
        let cookie_path = match std::env::var("LIBRIS_COOKIE_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(DEFAULT_COOKIE_FILE))
                .map_err(|_| ConfigError::MissingCookiePath)?,
        };
        let keepalive_interval_secs = env_parse_secs("LIBRIS_KEEPALIVE_INTERVAL_SECS", DEFAULT_KEEPALIVE_INTERVAL_SECS)?;

        Ok(Self { api_base, timeouts, cookie_secure, cookie_path, keepalive_interval_secs })
    }
}

/// Read a positive number of seconds, falling back to `default` when unset.
fn env_parse_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidValue { var: key, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_api_base(raw: Option<&str>) -> Result<String, ConfigError> {
    let base = raw.unwrap_or(DEFAULT_API_BASE).trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(base.to_owned())
    } else {
        Err(ConfigError::InvalidApiBase(base.to_owned()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
