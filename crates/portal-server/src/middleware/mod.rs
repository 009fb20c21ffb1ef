//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - [`resolve_session`] turns credential cookies into a [`Session`] and
//!   writes cookie changes back onto the response.
//! - [`enforce_access`] redirects requests that violate the route table.
//! - [`RouterSecurityExt`], [`RouterObservabilityExt`] and
//!   [`RouterRecoveryExt`] layer the ambient stack onto the finished router.
//!
//! [`Session`]: crate::service::Session

mod access;
mod observability;
mod recovery;
mod security;
mod session;

pub use access::{AccessDecision, RouteAccess, decide, enforce_access, login_redirect};
pub use observability::{RouterObservabilityExt, log_requests};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};
pub use session::resolve_session;
