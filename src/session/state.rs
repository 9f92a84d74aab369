//! Auth-session state for the current client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by route guards and dependent stores; mutated only by
//! `SessionStore` through the transition methods below.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use crate::net::types::User;

/// Where the session is in its lifecycle.
///
/// `Uninitialized → Pending → {Authenticated, Unauthenticated}`; a later
/// revalidation moves back through `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Pending,
    Authenticated,
    Unauthenticated,
}

/// Authentication state: identity, credential, and progress flags.
///
/// `is_authenticated` is computed from `user` and `token`, so the two can
/// never disagree with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    user: Option<User>,
    token: Option<String>,
    phase: SessionPhase,
    loading: bool,
    initialized: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True while a login or register call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once the session has been checked at least once. Before that,
    /// a missing user means "not yet known", not "logged out".
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn begin_check(&mut self) {
        self.phase = SessionPhase::Pending;
    }

    pub(crate) fn authenticate(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
        self.phase = SessionPhase::Authenticated;
        self.initialized = true;
    }

    /// Settle as checked-and-anonymous. In-flight `loading` is preserved.
    pub(crate) fn settle_unauthenticated(&mut self) {
        self.user = None;
        self.token = None;
        self.phase = SessionPhase::Unauthenticated;
        self.initialized = true;
    }
}
