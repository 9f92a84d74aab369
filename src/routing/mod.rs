//! Navigation guarding.
//!
//! SYSTEM CONTEXT
//! ==============
//! `guard` holds the pure allow/redirect rules over session state,
//! `middleware` applies them per route at navigation time, and `navigator`
//! is the seam that actually moves the client.

pub mod guard;
pub mod middleware;
pub mod navigator;

pub use guard::{GuardDecision, require_auth, require_authenticated, require_guest};
pub use middleware::{GuestRoute, Navigation, ProtectedRoute, RenderContext, RouteMiddleware, RouteTable};
pub use navigator::{HistoryNavigator, Navigator, Route};
