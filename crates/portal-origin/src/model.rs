//! Wire types of the origin authentication contract.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! bearer_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an opaque token string.
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Returns the raw token value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the token and returns the raw value.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(***)"))
            }
        }
    };
}

bearer_token! {
    /// Short-lived bearer credential accepted by protected origin endpoints.
    AccessToken
}

bearer_token! {
    /// Long-lived credential used only to mint a new token pair.
    RefreshToken
}

/// Account identity as reported by the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

/// Token pair issued by register, login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// Access token lifetime in seconds, as declared by the origin.
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

/// Registration payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Login payload. `login` is either an email address or a username.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}
