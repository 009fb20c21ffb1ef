//! Authentication calls against the origin.

use serde_json::json;

use crate::{
    AccessToken, LoginRequest, OriginClient, OriginRequest, RefreshToken, RegisterRequest, Result,
    TokenGrant, User, TRACING_TARGET,
};

impl OriginClient {
    /// Validates an access token and returns the identity it belongs to.
    pub async fn me(&self, token: &AccessToken) -> Result<User> {
        let request = OriginRequest::get("/me").with_bearer(token);
        self.forward(request).await?.json()
    }

    /// Creates an account and returns its first token pair.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<TokenGrant> {
        let request = OriginRequest::post("/auth/register").with_json(serde_json::to_value(payload)?);
        let grant: TokenGrant = self.forward(request).await?.json()?;

        tracing::info!(
            target: TRACING_TARGET,
            user_id = %grant.user.user_id,
            "account registered"
        );

        Ok(grant)
    }

    /// Exchanges credentials for a token pair.
    pub async fn login(&self, payload: &LoginRequest) -> Result<TokenGrant> {
        let request = OriginRequest::post("/auth/login").with_json(serde_json::to_value(payload)?);
        let grant: TokenGrant = self.forward(request).await?.json()?;

        tracing::info!(
            target: TRACING_TARGET,
            user_id = %grant.user.user_id,
            "logged in"
        );

        Ok(grant)
    }

    /// Exchanges a refresh token for a rotated token pair.
    ///
    /// Any non-2xx answer is [`Error::Rejected`](crate::Error::Rejected).
    pub async fn refresh(&self, token: &RefreshToken) -> Result<TokenGrant> {
        let request = OriginRequest::post("/auth/refresh")
            .with_json(json!({ "refresh_token": token.as_str() }));
        self.forward(request).await?.json()
    }

    /// Revokes a refresh token.
    pub async fn logout(&self, token: &RefreshToken) -> Result<()> {
        let request = OriginRequest::post("/auth/logout")
            .with_json(json!({ "refresh_token": token.as_str() }));
        self.forward(request).await?.into_result()?;
        Ok(())
    }
}
