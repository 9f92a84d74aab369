//! Periodic health pings that keep an idle-sleeping backend awake.
//!
//! The first ping fires one full interval after `start`. Pings never retry
//! and never fail the caller; outcomes are only logged.

#[cfg(test)]
#[path = "keepalive_test.rs"]
mod keepalive_test;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::net::BackendApi;

pub struct KeepAlive {
    api: Arc<dyn BackendApi>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl KeepAlive {
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>, interval: Duration) -> Self {
        Self { api, interval, task: Mutex::new(None) }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the ping loop. Calling again while running does nothing, and a
    /// zero interval never starts.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.interval.is_zero() {
            tracing::warn!("keep-alive interval is zero; not starting");
            return;
        }
        let mut task = self.lock_task();
        if task.is_some() {
            return;
        }
        let api = self.api.clone();
        let interval = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                ping_once(api.as_ref()).await;
            }
        }));
        tracing::info!(interval_secs = interval.as_secs(), "keep-alive started");
    }

    pub fn stop(&self) {
        if let Some(task) = self.lock_task().take() {
            task.abort();
            tracing::info!("keep-alive stopped");
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock_task().is_some()
    }

    /// Send a single health ping now.
    pub async fn ping(&self) {
        ping_once(self.api.as_ref()).await;
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn ping_once(api: &dyn BackendApi) {
    match api.health().await {
        Ok(()) => tracing::info!("keep-alive ping succeeded"),
        Err(e) => tracing::warn!(error = %e, "keep-alive ping failed"),
    }
}
