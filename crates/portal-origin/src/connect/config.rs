//! Configuration for the origin client.

use std::time::Duration;

use url::Url;

/// Default timeout for a single origin call: 10 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default origin base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// Configuration for the [`OriginClient`](super::OriginClient).
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Base URL every origin path is appended to.
    pub base_url: Url,
    /// Timeout applied to each request, connect and body included.
    pub timeout: Duration,
    /// User-Agent header sent with requests.
    pub user_agent: Option<String>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

impl OriginConfig {
    /// Creates a configuration pointing at the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective user agent, using the crate default if unset.
    pub fn effective_user_agent(&self) -> String {
        match &self.user_agent {
            Some(user_agent) if !user_agent.is_empty() => user_agent.clone(),
            _ => format!("portal/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Builds the absolute URL of an origin path.
    ///
    /// The path is appended to the base URL rather than resolved against it,
    /// so a base of `http://host/v1` and a path of `/me` yield
    /// `http://host/v1/me`.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}
