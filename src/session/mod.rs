//! Authentication session: state, lifecycle events, and the owning store.
//!
//! DESIGN
//! ======
//! `SessionSnapshot` is the plain state value, `SessionStore` owns the only
//! writable copy and performs login/restore/logout, and `SessionEvent` is the
//! one-directional signal dependent stores subscribe to.

pub mod events;
pub mod state;
pub mod store;

pub use events::{SessionEvent, SessionListener};
pub use state::{SessionPhase, SessionSnapshot};
pub use store::SessionStore;
