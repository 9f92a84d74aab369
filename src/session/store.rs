//! Session store — owns the authenticated session and its transitions.
//!
//! ARCHITECTURE
//! ============
//! State lives in a `watch` channel: this store is the only writer and any
//! number of readers can `watch()` for changes. The persisted cookie is read
//! on restore, written on login, and cleared on logout.
//!
//! CONCURRENCY
//! ===========
//! `ensure_initialized` and `restore` serialize on `init_gate`. A caller that
//! waited on the gate re-checks `initialized` before touching the network, so
//! a bootstrap hook and a route guard racing at startup issue one session
//! check between them. Explicit `restore` calls always revalidate, one at a
//! time, and converge on the same final state.
//!
//! Every emitted `SessionEvent` bumps `generation`. A restore whose session
//! check straddles a login or logout drops its result, and dependent stores
//! use the same counter to drop responses from an earlier session.
//!
//! ERROR HANDLING
//! ==============
//! Login and register errors are returned unchanged. Restore never fails: any
//! transport error or rejected token becomes a logout.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tokio::sync::{Mutex, watch};

use super::events::{SessionEvent, SessionListener};
use super::state::SessionSnapshot;
use crate::credential::CredentialStore;
use crate::net::types::{AuthResponse, LoginCredentials, MeResponse, RegisterData, User};
use crate::net::{ApiError, BackendApi};
use crate::routing::navigator::{Navigator, Route};

/// Clears `loading` when dropped, so every exit path of a call (success,
/// error, or a cancelled future) releases the flag.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionSnapshot>) -> Self {
        state.send_modify(|s| s.set_loading(true));
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.set_loading(false));
    }
}

/// Single owned session context, shared as `Arc<SessionStore>`.
pub struct SessionStore {
    api: Arc<dyn BackendApi>,
    jar: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionSnapshot>,
    listeners: RwLock<Vec<Weak<dyn SessionListener>>>,
    init_gate: Mutex<()>,
    generation: AtomicU64,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>, jar: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            api,
            jar,
            navigator,
            state,
            listeners: RwLock::new(Vec::new()),
            init_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_owned)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_initialized()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Counter bumped on every session start or end. Equal values mean no
    /// session boundary was crossed in between.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Register a listener for session events.
    ///
    /// Only a weak reference is kept; a listener that is dropped elsewhere
    /// stops receiving events.
    pub fn subscribe(&self, listener: &Arc<dyn SessionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Arc::downgrade(listener));
    }

    fn emit(&self, event: &SessionEvent) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let live: Vec<Arc<dyn SessionListener>> = {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener.on_session_event(event);
        }
    }

    pub async fn navigate(&self, route: Route) {
        self.navigator.navigate(route.path()).await;
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Sign in with email and password and persist the returned token.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; the session is left as it was.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let _loading = LoadingGuard::begin(&self.state);
        let response = self.api.login(credentials).await.inspect_err(|e| {
            tracing::warn!(email = %credentials.email, error = %e, "login failed");
        })?;

        if self.user().is_some_and(|current| current.id != response.user.id) {
            tracing::info!(user_id = %response.user.id, "login replaces another user's session");
            self.emit(&SessionEvent::Ended);
        }
        self.state
            .send_modify(|s| s.authenticate(response.user.clone(), response.token.clone()));
        if let Err(e) = self.jar.save(&response.token) {
            tracing::warn!(error = %e, "failed to persist auth cookie");
        }
        tracing::info!(user_id = %response.user.id, "login succeeded");
        self.emit(&SessionEvent::Started { user_id: response.user.id.clone() });
        Ok(response)
    }

    /// Create an account. Does not sign in and leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged (e.g. duplicate email).
    pub async fn register(&self, data: &RegisterData) -> Result<serde_json::Value, ApiError> {
        let _loading = LoadingGuard::begin(&self.state);
        let response = self.api.register(data).await.inspect_err(|e| {
            tracing::warn!(email = %data.email, error = %e, "registration failed");
        })?;
        tracing::info!(email = %data.email, "registration accepted");
        Ok(response)
    }

    /// Revalidate the persisted credential. Returns whether a session is active.
    pub async fn restore(&self) -> bool {
        let _gate = self.init_gate.lock().await;
        self.restore_locked().await
    }

    /// Restore once if the session has never been checked, then report
    /// whether it is authenticated.
    pub async fn ensure_initialized(&self) -> bool {
        if self.is_initialized() {
            return self.is_authenticated();
        }
        let _gate = self.init_gate.lock().await;
        if !self.is_initialized() {
            self.restore_locked().await;
        }
        self.is_authenticated()
    }

    async fn restore_locked(&self) -> bool {
        let token = match self.jar.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "auth cookie unreadable; treating as signed out");
                None
            }
        };

        let Some(token) = token else {
            if self.is_authenticated() {
                self.logout().await;
            } else {
                self.state.send_modify(SessionSnapshot::settle_unauthenticated);
            }
            tracing::debug!("no persisted session");
            return false;
        };

        self.state.send_modify(SessionSnapshot::begin_check);
        let generation = self.generation();
        let checked = self.api.current_user(&token).await;
        if self.generation() != generation {
            tracing::debug!("session changed during check; result discarded");
            return self.is_authenticated();
        }
        match checked {
            Ok(MeResponse { success: true, user: Some(user) }) => {
                let user_id = user.id.clone();
                self.state.send_modify(|s| s.authenticate(user, token));
                tracing::info!(%user_id, "session restored");
                self.emit(&SessionEvent::Started { user_id });
                true
            }
            Ok(_) => {
                tracing::info!("persisted session rejected");
                self.logout().await;
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "session check failed");
                self.logout().await;
                false
            }
        }
    }

    /// End the session: notify dependents, clear state and cookie, go to `/login`.
    pub async fn logout(&self) {
        self.emit(&SessionEvent::Ended);
        self.state.send_modify(SessionSnapshot::settle_unauthenticated);
        if let Err(e) = self.jar.clear() {
            tracing::warn!(error = %e, "failed to clear auth cookie");
        }
        tracing::info!("session ended");
        self.navigate(Route::Login).await;
    }
}
