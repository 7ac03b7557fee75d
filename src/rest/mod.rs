//! Thin REST client over a fixed base URL.
//!
//! The client owns a base URL and an optional request template; verb methods
//! concatenate an endpoint onto the base, merge per-call options over the
//! template, and surface transport failures as a single error type. HTTP
//! error statuses are data, not errors: a 404 comes back as a response.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Failure modes of the REST client.
#[derive(Debug, Error)]
pub enum RestError {
    /// The base URL or request options are malformed.
    #[error("invalid REST configuration: {0}")]
    InvalidConfiguration(String),
    /// The request never produced an HTTP response (DNS, refused
    /// connection, timeout, TLS).
    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// Supported HTTP verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

/// Per-request options, also usable as a client-wide template.
///
/// When a client carries a template, per-call options are merged over it:
/// map entries are unioned with the call side winning on key collisions, and
/// scalar fields win whenever the call side sets them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Merge `overrides` over this template, returning the effective
    /// options. Neither input is mutated.
    pub fn merge(&self, overrides: &RequestOptions) -> RequestOptions {
        let mut merged = self.clone();
        merged
            .headers
            .extend(overrides.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
            .query
            .extend(overrides.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        if overrides.timeout.is_some() {
            merged.timeout = overrides.timeout;
        }
        if overrides.body.is_some() {
            merged.body = overrides.body.clone();
        }
        merged
    }

    /// Ingest options from a JSON object with optional `headers`, `query`,
    /// `timeout` (seconds) and `body` keys.
    pub fn from_json(value: &Value) -> Result<Self, RestError> {
        let Value::Object(map) = value else {
            return Err(RestError::InvalidConfiguration(
                "request options must be an object".to_string(),
            ));
        };
        let mut options = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "headers" => options.headers = string_map(key, value)?,
                "query" => options.query = string_map(key, value)?,
                "timeout" => {
                    let seconds = value.as_f64().filter(|s| *s > 0.0).ok_or_else(|| {
                        RestError::InvalidConfiguration(
                            "timeout must be a positive number of seconds".to_string(),
                        )
                    })?;
                    options.timeout = Some(Duration::from_secs_f64(seconds));
                }
                "body" => {
                    let body = value.as_str().ok_or_else(|| {
                        RestError::InvalidConfiguration("body must be a string".to_string())
                    })?;
                    options.body = Some(body.to_string());
                }
                other => {
                    return Err(RestError::InvalidConfiguration(format!(
                        "unknown request option: {other}"
                    )));
                }
            }
        }
        Ok(options)
    }
}

fn string_map(key: &str, value: &Value) -> Result<BTreeMap<String, String>, RestError> {
    let Value::Object(map) = value else {
        return Err(RestError::InvalidConfiguration(format!(
            "{key} must be an object of strings"
        )));
    };
    map.iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), s.to_string()))
                .ok_or_else(|| {
                    RestError::InvalidConfiguration(format!("{key}.{k} must be a string"))
                })
        })
        .collect()
}

/// HTTP client bound to one service base URL.
#[derive(Debug)]
pub struct RestClient {
    agent: ureq::Agent,
    base_url: String,
    template: RequestOptions,
}

impl RestClient {
    /// Create a client for `base_url` with no request template.
    pub fn new(base_url: &str) -> Result<Self, RestError> {
        Self::with_template(base_url, RequestOptions::new())
    }

    /// Create a client whose template supplies defaults for every request.
    pub fn with_template(base_url: &str, template: RequestOptions) -> Result<Self, RestError> {
        let mut client = Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: String::new(),
            template,
        };
        client.set_base_url(base_url)?;
        Ok(client)
    }

    /// Replace the base URL. A single trailing slash is stripped so endpoint
    /// concatenation yields exactly one separator.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), RestError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(RestError::InvalidConfiguration(
                "base URL must not be empty".to_string(),
            ));
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(RestError::InvalidConfiguration(format!(
                "base URL must use http or https: {trimmed}"
            )));
        }
        self.base_url = trimmed.strip_suffix('/').unwrap_or(trimmed).to_string();
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn template(&self) -> &RequestOptions {
        &self.template
    }

    /// Join an endpoint onto the base URL.
    ///
    /// One leading slash on the endpoint is ignored, so `users` and
    /// `/users` address the same resource; an empty endpoint yields the bare
    /// base URL.
    pub fn build_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Issue a request against `endpoint` with `options` merged over the
    /// client template.
    ///
    /// Responses with error statuses (4xx, 5xx) are returned like any
    /// other; only transport-level failures become [`RestError`].
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<ureq::Response, RestError> {
        let effective = self.template.merge(options);
        let url = self.build_url(endpoint);
        let mut request = self.agent.request(method.as_str(), &url);
        for (name, value) in &effective.headers {
            request = request.set(name, value);
        }
        for (name, value) in &effective.query {
            request = request.query(name, value);
        }
        if let Some(timeout) = effective.timeout {
            request = request.timeout(timeout);
        }
        let outcome = match &effective.body {
            Some(body) => request.send_string(body),
            None => request.call(),
        };
        match outcome {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(_, response)) => Ok(response),
            Err(err) => Err(RestError::RequestFailed(err.to_string())),
        }
    }

    pub fn get(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Get, endpoint, options)
    }

    pub fn post(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Post, endpoint, options)
    }

    pub fn put(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Put, endpoint, options)
    }

    pub fn patch(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Patch, endpoint, options)
    }

    pub fn delete(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Delete, endpoint, options)
    }

    pub fn options(&self, endpoint: &str, options: &RequestOptions) -> Result<ureq::Response, RestError> {
        self.request(Method::Options, endpoint, options)
    }
}
