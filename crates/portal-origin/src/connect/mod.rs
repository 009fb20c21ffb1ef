//! Origin client and its configuration.

mod client;
mod config;

pub use client::{OriginClient, TRACING_TARGET};
pub use config::OriginConfig;
