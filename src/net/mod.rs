//! Networking modules for the book tracker REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the `BackendApi` seam and its `reqwest` implementation,
//! `error` the transport error type, and `types` the shared wire schema.

pub mod api;
pub mod error;
pub mod types;

pub use api::{BackendApi, HttpApi};
pub use error::ApiError;
