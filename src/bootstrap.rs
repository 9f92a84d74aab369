//! One-time session bootstrap at client start.
//!
//! Runs before the first guarded navigation so guards see an initialized
//! session. Guards call `ensure_initialized` themselves too; the session
//! store deduplicates the two, so a race between them costs one check.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use tokio::sync::OnceCell;

use crate::routing::RenderContext;
use crate::session::SessionStore;

#[derive(Debug, Default)]
pub struct Bootstrap {
    restored: OnceCell<bool>,
}

impl Bootstrap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the session once per client load and report whether it is
    /// authenticated now. Concurrent callers await the same run. Does nothing
    /// during server rendering.
    pub async fn run(&self, session: &SessionStore, ctx: RenderContext) -> bool {
        if ctx == RenderContext::Server {
            return false;
        }
        self.restored
            .get_or_init(|| async {
                let authenticated = session.ensure_initialized().await;
                tracing::info!(authenticated, "client bootstrap complete");
                authenticated
            })
            .await;
        session.is_authenticated()
    }

    #[must_use]
    pub fn has_run(&self) -> bool {
        self.restored.initialized()
    }
}
