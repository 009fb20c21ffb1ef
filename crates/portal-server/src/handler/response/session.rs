use portal_origin::User;
use serde::Serialize;

/// `{ "user": ... }`, with `null` for a signed-out visitor.
///
/// Token values never appear in a response body.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: Option<User>,
}

impl UserResponse {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }
}

/// `{ "success": true }`.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}
