//! Session guard rules shared by route middleware and commands.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::navigator::Route;
use crate::session::SessionStore;

/// Outcome of a guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Allow only authenticated sessions; others are sent to `/login`.
pub async fn require_authenticated(session: &SessionStore) -> GuardDecision {
    if session.ensure_initialized().await {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(Route::Login)
    }
}

/// Allow only anonymous sessions; signed-in users are sent to `/`.
pub async fn require_guest(session: &SessionStore) -> GuardDecision {
    if session.ensure_initialized().await {
        GuardDecision::Redirect(Route::Home)
    } else {
        GuardDecision::Allow
    }
}

/// Check authentication and navigate to `/login` when it is missing.
/// Returns whether the caller may proceed.
pub async fn require_auth(session: &SessionStore) -> bool {
    match require_authenticated(session).await {
        GuardDecision::Allow => true,
        GuardDecision::Redirect(route) => {
            session.navigate(route).await;
            false
        }
    }
}
