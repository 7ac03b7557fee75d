//! HTTP sink delivering records to a web endpoint.

use std::io;
use std::str::FromStr;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::{Agent, AgentBuilder};

use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::error::ConfigError;
use crate::formatter::DEFAULT_DATE_FORMAT;
use crate::record::LogRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery method for [`HttpSink`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HttpMethod {
    /// Record fields travel in the URL query string.
    #[default]
    Get,
    /// Record fields travel url-encoded in the request body.
    Post,
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "unsupported http sink method: {other}"
            ))),
        }
    }
}

/// Sink sending each record's fields to `host` + `url` via a pooled agent.
///
/// A non-2xx response still means the record was delivered and is not
/// treated as an emit failure; only transport-level problems surface.
pub struct HttpSink {
    core: SinkCore,
    agent: Agent,
    url: String,
    method: HttpMethod,
    auth_header: Option<String>,
}

impl HttpSink {
    pub fn new(
        host: &str,
        url: &str,
        method: HttpMethod,
        secure: bool,
        credentials: Option<(String, String)>,
    ) -> Self {
        let scheme = if secure { "https" } else { "http" };
        let path = if url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{url}")
        };
        let auth_header = credentials.map(|(user, pass)| {
            format!(
                "Basic {}",
                BASE64_STANDARD.encode(format!("{user}:{pass}"))
            )
        });
        Self {
            core: SinkCore::new(),
            agent: AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            url: format!("{scheme}://{host}{path}"),
            method,
            auth_header,
        }
    }

    fn record_fields(&self, record: &LogRecord) -> Vec<(&'static str, String)> {
        vec![
            ("name", record.logger.clone()),
            ("levelname", record.level.to_string()),
            ("asctime", record.timestamp.format(DEFAULT_DATE_FORMAT).to_string()),
            ("message", record.message.clone()),
        ]
    }
}

fn url_encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, NON_ALPHANUMERIC),
                utf8_percent_encode(value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

impl Sink for HttpSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Http
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let fields = self.record_fields(record);
        let mut request = match self.method {
            HttpMethod::Get => {
                let mut request = self.agent.get(&self.url);
                for (key, value) in &fields {
                    request = request.query(key, value);
                }
                request
            }
            HttpMethod::Post => self.agent.post(&self.url).set(
                "Content-Type",
                "application/x-www-form-urlencoded",
            ),
        };
        if let Some(auth) = &self.auth_header {
            request = request.set("Authorization", auth);
        }
        let result = match self.method {
            HttpMethod::Get => request.call(),
            HttpMethod::Post => request.send_string(&url_encode_pairs(&fields)),
        };
        match result {
            Ok(_) | Err(ureq::Error::Status(_, _)) => Ok(()),
            Err(err) => Err(io::Error::other(err.to_string())),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.core.mark_closed();
        Ok(())
    }
}
