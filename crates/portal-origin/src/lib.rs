#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod auth;
mod connect;
mod error;
mod forward;
mod model;

pub use crate::connect::{OriginClient, OriginConfig, TRACING_TARGET};
pub use crate::error::{Error, Result};
pub use crate::forward::{OriginRequest, OriginResponse};
pub use crate::model::{
    AccessToken, LoginRequest, RefreshToken, RegisterRequest, TokenGrant, User,
};
