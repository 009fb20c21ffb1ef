//! Request extractors.
//!
//! - [`Json`], [`Path`] and [`Query`] wrap their `axum` counterparts and
//!   reject with the JSON error envelope instead of plain text.
//! - [`ValidateJson`] additionally applies `validator` rules.
//! - [`CurrentSession`] yields the session resolved for this request.
//! - [`AccessCredential`] yields the access token or rejects with `401`.

mod json;
mod path;
mod query;
mod session;
mod validate;

pub use crate::extract::json::Json;
pub use crate::extract::path::Path;
pub use crate::extract::query::Query;
pub use crate::extract::session::{AccessCredential, CurrentSession};
pub use crate::extract::validate::ValidateJson;

/// Keeps the first lines of a rejection message and caps its length.
fn sanitize_error_message(message: &str, max_chars: usize) -> String {
    message
        .lines()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}
