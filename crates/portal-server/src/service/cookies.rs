//! Credential cookies: how the token pair is read from and written to the
//! browser.

use std::convert::Infallible;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use portal_origin::{AccessToken, RefreshToken, TokenGrant};
use time::Duration;

use crate::TRACING_TARGET_SESSION;

/// Name of the cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Name of the cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Default access cookie lifetime when the origin declares none.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::seconds(3600);

/// Default refresh cookie lifetime.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(30);

/// The two bearer strings of one browser session. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl Credentials {
    /// Returns the pair carried by a grant.
    pub fn from_grant(grant: &TokenGrant) -> Self {
        Self {
            access_token: Some(grant.access_token.clone()),
            refresh_token: Some(grant.refresh_token.clone()),
        }
    }

    /// Returns `true` when neither token is present.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Attributes applied to both credential cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    secure: bool,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CookiePolicy {
    /// Creates a policy; `secure` adds the `Secure` attribute.
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            access_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_ttl: DEFAULT_REFRESH_TOKEN_TTL,
        }
    }

    /// Sets the access cookie lifetime used when the origin declares none.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh cookie lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Reads the token pair from the request cookies. Empty values count as
    /// absent.
    pub fn read(&self, jar: &CookieJar) -> Credentials {
        let value = |name: &str| {
            jar.get(name)
                .map(|cookie| cookie.value().to_owned())
                .filter(|value| !value.is_empty())
        };

        Credentials {
            access_token: value(ACCESS_TOKEN_COOKIE).map(AccessToken::new),
            refresh_token: value(REFRESH_TOKEN_COOKIE).map(RefreshToken::new),
        }
    }

    /// Returns the cookie pair storing a freshly issued grant.
    pub fn issue(&self, grant: &TokenGrant) -> CredentialCookies {
        let access_ttl = grant
            .expires_in
            .filter(|secs| *secs > 0)
            .and_then(|secs| i64::try_from(secs).ok())
            .map(Duration::seconds)
            .unwrap_or(self.access_ttl);

        CredentialCookies {
            access: self.build(ACCESS_TOKEN_COOKIE, grant.access_token.as_str(), access_ttl),
            refresh: self.build(
                REFRESH_TOKEN_COOKIE,
                grant.refresh_token.as_str(),
                self.refresh_ttl,
            ),
        }
    }

    /// Returns the cookie pair deleting both credentials.
    pub fn expire(&self) -> CredentialCookies {
        CredentialCookies {
            access: self.build(ACCESS_TOKEN_COOKIE, "", Duration::ZERO),
            refresh: self.build(REFRESH_TOKEN_COOKIE, "", Duration::ZERO),
        }
    }

    fn build(&self, name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value.to_owned()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build()
    }
}

/// Marker left in response extensions once a handler has written the
/// credential pair, so the session layer does not write it again.
#[derive(Debug, Clone, Copy)]
pub struct CredentialsWritten;

/// Both credential cookies, always written together.
#[must_use = "cookies do nothing unless added to a response"]
#[derive(Debug, Clone)]
pub struct CredentialCookies {
    access: Cookie<'static>,
    refresh: Cookie<'static>,
}

impl CredentialCookies {
    pub fn access(&self) -> &Cookie<'static> {
        &self.access
    }

    pub fn refresh(&self) -> &Cookie<'static> {
        &self.refresh
    }

    /// Appends one `Set-Cookie` header per credential.
    pub fn append_to(&self, headers: &mut HeaderMap) {
        for cookie in [&self.access, &self.refresh] {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(_) => tracing::error!(
                    target: TRACING_TARGET_SESSION,
                    cookie = cookie.name(),
                    "credential cookie is not a valid header value"
                ),
            }
        }
    }
}

impl IntoResponseParts for CredentialCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.append_to(res.headers_mut());
        res.extensions_mut().insert(CredentialsWritten);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;
    use portal_origin::User;

    use super::*;

    fn grant(expires_in: Option<u64>) -> TokenGrant {
        TokenGrant {
            access_token: AccessToken::new("a1"),
            refresh_token: RefreshToken::new("r1"),
            expires_in,
            user: User {
                user_id: "u1".into(),
                email: "a@b.com".into(),
                username: "a".into(),
            },
        }
    }

    fn set_cookies(cookies: &CredentialCookies) -> Vec<String> {
        let mut headers = HeaderMap::new();
        cookies.append_to(&mut headers);
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn issued_cookies_carry_attributes() {
        let cookies = CookiePolicy::new(true).issue(&grant(Some(900)));
        let headers = set_cookies(&cookies);

        assert_eq!(headers.len(), 2);
        let access = &headers[0];
        assert!(access.starts_with("access_token=a1"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Secure"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("Max-Age=900"));

        let refresh = &headers[1];
        assert!(refresh.starts_with("refresh_token=r1"));
        assert!(refresh.contains("Max-Age=2592000"));
    }

    #[test]
    fn access_ttl_falls_back_without_expires_in() {
        let cookies = CookiePolicy::new(false).issue(&grant(None));

        assert_eq!(cookies.access().max_age(), Some(Duration::seconds(3600)));
        assert_eq!(cookies.access().secure(), Some(false));
    }

    #[test]
    fn expired_cookies_are_empty() {
        let cookies = CookiePolicy::default().expire();

        for cookie in [cookies.access(), cookies.refresh()] {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert_eq!(cookie.path(), Some("/"));
        }
    }

    #[test]
    fn read_ignores_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("access_token=; refresh_token=r9"),
        );
        let jar = CookieJar::from_headers(&headers);

        let credentials = CookiePolicy::default().read(&jar);
        assert!(credentials.access_token.is_none());
        assert_eq!(
            credentials.refresh_token.as_ref().map(RefreshToken::as_str),
            Some("r9")
        );
    }
}
