//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, signed cookie, in-memory store)
//!
//! Authentication is enforced per handler through the extractors in [`auth`].

pub mod auth;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, login_path, set_current_user,
};
pub use session::create_session_layer;
