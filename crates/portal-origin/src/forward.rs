//! Opaque origin calls used by passthrough endpoints and page loaders.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{AccessToken, Error, Result};

/// A single call to an origin path.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    method: Method,
    path: String,
    bearer: Option<AccessToken>,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl OriginRequest {
    /// Creates a request with the given method and origin path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches the access token as a bearer credential.
    pub fn with_bearer(mut self, token: &AccessToken) -> Self {
        self.bearer = Some(token.clone());
        self
    }

    /// Attaches the access token if one is present.
    pub fn with_optional_bearer(mut self, token: Option<&AccessToken>) -> Self {
        self.bearer = token.cloned();
        self
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a JSON request body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bearer(&self) -> Option<&AccessToken> {
        self.bearer.as_ref()
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// What the origin answered: status and JSON body, if any.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl OriginResponse {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a non-2xx answer into [`Error::Rejected`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Rejected {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Decodes the body of a 2xx answer.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.into_result()?;
        let body = response.body.unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }
}
