//! Route middleware applied before a target route renders.
//!
//! DESIGN
//! ======
//! Each navigation runs `Uninitialized → (restore) → {Authenticated,
//! Unauthenticated} → Allow | Redirect`. Middleware evaluated during server
//! rendering always allows: session state only exists on the client, and
//! deciding there would disagree with what the client later sees.

#[cfg(test)]
#[path = "middleware_test.rs"]
mod middleware_test;

use std::sync::Arc;

use super::guard::{GuardDecision, require_authenticated, require_guest};
use super::navigator::Navigator;
use crate::session::SessionStore;

/// Where a navigation is being evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderContext {
    Server,
    Client,
}

/// A check run before entering a route.
#[async_trait::async_trait]
pub trait RouteMiddleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn before_enter(&self, ctx: RenderContext, target: &str) -> GuardDecision;
}

/// Routes that need a signed-in user.
pub struct ProtectedRoute {
    session: Arc<SessionStore>,
}

impl ProtectedRoute {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl RouteMiddleware for ProtectedRoute {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn before_enter(&self, ctx: RenderContext, target: &str) -> GuardDecision {
        if ctx == RenderContext::Server {
            return GuardDecision::Allow;
        }
        let decision = require_authenticated(&self.session).await;
        if decision != GuardDecision::Allow {
            tracing::debug!(%target, "protected route denied");
        }
        decision
    }
}

/// Routes only meaningful to anonymous users (login, register).
pub struct GuestRoute {
    session: Arc<SessionStore>,
}

impl GuestRoute {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl RouteMiddleware for GuestRoute {
    fn name(&self) -> &'static str {
        "guest"
    }

    async fn before_enter(&self, ctx: RenderContext, target: &str) -> GuardDecision {
        if ctx == RenderContext::Server {
            return GuardDecision::Allow;
        }
        let decision = require_guest(&self.session).await;
        if decision != GuardDecision::Allow {
            tracing::debug!(%target, "guest route denied");
        }
        decision
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// Result of a guarded navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Rendered(String),
    Redirected { from: String, to: String },
}

/// Maps path prefixes to middleware and performs guarded navigation.
///
/// The longest matching prefix wins. A prefix matches the path itself and
/// anything below it (`/library` matches `/library/42`), and `/` matches
/// every path. Paths with no match render unguarded.
pub struct RouteTable {
    routes: Vec<(String, Arc<dyn RouteMiddleware>)>,
    navigator: Arc<dyn Navigator>,
}

impl RouteTable {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { routes: Vec::new(), navigator }
    }

    #[must_use]
    pub fn route(mut self, prefix: &str, middleware: Arc<dyn RouteMiddleware>) -> Self {
        self.routes.push((prefix.to_owned(), middleware));
        self
    }

    #[must_use]
    pub fn middleware_for(&self, path: &str) -> Option<&Arc<dyn RouteMiddleware>> {
        self.routes
            .iter()
            .filter(|(prefix, _)| prefix_matches(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, mw)| mw)
    }

    /// Run the middleware for `path` and move to the target or the redirect.
    pub async fn navigate(&self, ctx: RenderContext, path: &str) -> Navigation {
        let decision = match self.middleware_for(path) {
            Some(mw) => mw.before_enter(ctx, path).await,
            None => GuardDecision::Allow,
        };
        match decision {
            GuardDecision::Allow => {
                self.navigator.navigate(path).await;
                Navigation::Rendered(path.to_owned())
            }
            GuardDecision::Redirect(route) => {
                tracing::info!(from = %path, to = %route.path(), "navigation redirected");
                self.navigator.navigate(route.path()).await;
                Navigation::Redirected { from: path.to_owned(), to: route.path().to_owned() }
            }
        }
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    let trimmed = prefix.trim_end_matches('/');
    path == prefix || path == trimmed || path.starts_with(&format!("{trimmed}/"))
}
