//! Session-dependent stores.
//!
//! DESIGN
//! ======
//! Each store reads the bearer token from the shared `SessionStore` on every
//! call and subscribes to `SessionEvent::Ended` to drop per-user data. The
//! dependency is one-directional: stores never write to the session.
//! Responses that arrive after the session generation moved on are dropped.
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`, so listeners can clear it synchronously from inside logout.

pub mod books;
pub mod library;

pub use books::{BookSearchState, BookSearchStore};
pub use library::{LibraryError, LibraryState, LibraryStore};
