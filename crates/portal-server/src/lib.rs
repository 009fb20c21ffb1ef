#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

#[cfg(test)]
mod testing;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};

/// Session resolution, token refresh and cookie writes.
pub const TRACING_TARGET_SESSION: &str = "portal_server::session";

/// Route classification and redirects.
pub const TRACING_TARGET_GATE: &str = "portal_server::gate";

/// Browser-facing endpoints and page loaders.
pub const TRACING_TARGET_HANDLER: &str = "portal_server::handler";
