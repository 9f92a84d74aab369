//! Persisted auth credential: the `auth-token` cookie.
//!
//! ARCHITECTURE
//! ============
//! The cookie is the source of truth for session restore. It is written only
//! on login and cleared only on logout; everything else reads it. A cookie
//! whose `Expires` has passed is treated as absent, so a stale token never
//! reaches the network.
//!
//! Two jars are provided: `MemoryCookieJar` for a single process and
//! `FileCookieJar`, which stores the serialized `Set-Cookie` line on disk so
//! the session survives restarts of the command-line client.

#[cfg(test)]
#[path = "credential_test.rs"]
mod credential_test;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

pub const AUTH_COOKIE_NAME: &str = "auth-token";
pub const AUTH_COOKIE_MAX_AGE: Duration = Duration::hours(24);

#[derive(Debug, thiserror::Error)]
pub enum CookieJarError {
    #[error("cookie file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed cookie: {0}")]
    Parse(#[from] cookie::ParseError),
}

/// Attributes applied to the auth cookie when it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub max_age: Duration,
    pub secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self { max_age: AUTH_COOKIE_MAX_AGE, secure: false }
    }
}

/// Build the auth cookie: readable by client code, lax same-site, 24h by default.
#[must_use]
pub fn build_auth_cookie(token: &str, policy: CookiePolicy, now: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, token.to_owned()))
        .path("/")
        .http_only(false)
        .secure(policy.secure)
        .same_site(SameSite::Lax)
        .max_age(policy.max_age)
        .expires(now + policy.max_age)
        .build()
}

/// The token carried by `cookie`, or `None` if it is not the auth cookie,
/// is empty, or has expired at `now`.
#[must_use]
pub fn live_token(cookie: &Cookie<'_>, now: OffsetDateTime) -> Option<String> {
    if cookie.name() != AUTH_COOKIE_NAME || cookie.value().is_empty() {
        return None;
    }
    match cookie.expires_datetime() {
        Some(expires) if expires <= now => None,
        _ => Some(cookie.value().to_owned()),
    }
}

/// Storage for the persisted session token.
pub trait CredentialStore: Send + Sync {
    /// The stored token, or `None` when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or parsed.
    fn load(&self) -> Result<Option<String>, CookieJarError>;

    /// Persist `token` with the jar's cookie policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &str) -> Result<(), CookieJarError>;

    /// Remove the stored token. Clearing an empty jar succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), CookieJarError>;
}

// =============================================================================
// MEMORY JAR
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    policy: CookiePolicy,
    cookie: Mutex<Option<Cookie<'static>>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new(policy: CookiePolicy) -> Self {
        Self { policy, cookie: Mutex::new(None) }
    }

    /// Jar pre-seeded with an existing cookie, as if set by an earlier page load.
    #[must_use]
    pub fn with_cookie(cookie: Cookie<'static>) -> Self {
        Self { policy: CookiePolicy::default(), cookie: Mutex::new(Some(cookie)) }
    }

    /// The raw cookie currently held, including expired ones.
    #[must_use]
    pub fn raw(&self) -> Option<Cookie<'static>> {
        self.cookie
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStore for MemoryCookieJar {
    fn load(&self) -> Result<Option<String>, CookieJarError> {
        let mut slot = self
            .cookie
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let token = slot
            .as_ref()
            .and_then(|c| live_token(c, OffsetDateTime::now_utc()));
        if token.is_none() {
            *slot = None;
        }
        Ok(token)
    }

    fn save(&self, token: &str) -> Result<(), CookieJarError> {
        let cookie = build_auth_cookie(token, self.policy, OffsetDateTime::now_utc());
        *self
            .cookie
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(cookie);
        Ok(())
    }

    fn clear(&self) -> Result<(), CookieJarError> {
        *self
            .cookie
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// FILE JAR
// =============================================================================

/// Cookie jar persisted as a single `Set-Cookie` line.
#[derive(Debug, Clone)]
pub struct FileCookieJar {
    path: PathBuf,
    policy: CookiePolicy,
}

impl FileCookieJar {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, policy: CookiePolicy) -> Self {
        Self { path: path.into(), policy }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CookieJarError {
        CookieJarError::Io { path: self.path.clone(), source }
    }
}

impl CredentialStore for FileCookieJar {
    fn load(&self) -> Result<Option<String>, CookieJarError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let cookie = Cookie::parse(line.to_owned())?;
        Ok(live_token(&cookie, OffsetDateTime::now_utc()))
    }

    fn save(&self, token: &str) -> Result<(), CookieJarError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let cookie = build_auth_cookie(token, self.policy, OffsetDateTime::now_utc());
        std::fs::write(&self.path, format!("{cookie}\n")).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "auth cookie written");
        Ok(())
    }

    fn clear(&self) -> Result<(), CookieJarError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
