//! [`Error`], [`ErrorKind`] and [`Result`].

mod http_error;
mod origin_error;

pub use http_error::{Error, ErrorKind, Result};
pub(crate) use origin_error::origin_failure;
