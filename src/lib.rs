//! # libris
//!
//! Client-side session and navigation-guard layer for the book tracker.
//!
//! The crate owns the authenticated session (login, restore from the
//! persisted `auth-token` cookie, logout), decides whether navigation to a
//! route may proceed, and drives the two stores that depend on the session
//! token: book search and the personal library.
//!
//! DESIGN
//! ======
//! A single `Arc<SessionStore>` is built at startup and injected into every
//! consumer. Dependent stores subscribe to `SessionEvent`s instead of being
//! called directly, so logout never needs to know who holds user data.

pub mod bootstrap;
pub mod config;
pub mod credential;
pub mod keepalive;
pub mod net;
pub mod routing;
pub mod session;
pub mod stores;

#[cfg(test)]
pub(crate) mod test_helpers;
