//! Navigation targets and the navigator seam.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod navigator_test;

use std::sync::Mutex;

/// Fixed redirect destinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
        }
    }
}

/// Moves the client to a new location.
#[async_trait::async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, path: &str);
}

/// In-process navigator that records every location visited.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent location, if any navigation happened.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl Navigator for HistoryNavigator {
    async fn navigate(&self, path: &str) {
        tracing::debug!(%path, "navigate");
        self.lock().push(path.to_owned());
    }
}
