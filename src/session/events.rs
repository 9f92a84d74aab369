//! Session lifecycle notifications.

/// Emitted by `SessionStore` when the session starts or ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in or a persisted session was restored.
    Started { user_id: String },
    /// The session ended. Listeners must drop any per-user data.
    Ended,
}

/// Receiver of [`SessionEvent`]s.
///
/// Called synchronously on the task performing the transition, before the
/// session's own state changes for `Ended`. Implementations must not block.
pub trait SessionListener: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}
