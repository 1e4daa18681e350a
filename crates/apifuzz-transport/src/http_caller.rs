//! `ureq`-backed [`ServiceCaller`].
//!
//! Every call is a single attempt bounded by the agent's read and connect
//! timeouts. Non-2xx statuses are ordinary responses here; only failures to
//! obtain a response at all become [`TransportError`]s. Requests carrying
//! header values `ureq` rejects go through [`RawRequestWriter`] instead.

use std::io;
use std::time::Duration;

use apifuzz_types::{Header, ServiceCaller, ServiceRequest, ServiceResponse, TransportError};
use tracing::trace;
use url::Url;

use crate::raw::{needs_raw_writer, RawRequestWriter};

/// Default base URL of the service under test.
pub const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Connection settings for [`HttpServiceCaller`].
#[derive(Debug, Clone)]
pub struct HttpCallerConfig {
    pub base_url: String,
    /// Per-call read timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpCallerConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Blocking HTTP client used to dispatch fuzzed requests.
#[derive(Clone)]
pub struct HttpServiceCaller {
    base_url: String,
    agent: ureq::Agent,
    raw: RawRequestWriter,
}

impl HttpServiceCaller {
    pub fn new(config: &HttpCallerConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent: Self::build_agent(config.timeout, config.connect_timeout),
            raw: RawRequestWriter {
                timeout: config.timeout,
                connect_timeout: config.connect_timeout,
            },
        }
    }

    fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(connect_timeout)
            .redirects(0)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Full URL of `request`, query parameters included.
    fn request_url(&self, request: &ServiceRequest) -> Result<Url, TransportError> {
        let raw = self.url_for(&request.path);
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidRequest {
            reason: format!("invalid URL {}: {}", raw, e),
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

impl ServiceCaller for HttpServiceCaller {
    fn call(&self, request: &ServiceRequest) -> Result<ServiceResponse, TransportError> {
        let url = self.request_url(request)?;
        if needs_raw_writer(request) {
            return self.raw.send(&url, request);
        }
        let url = url.as_str();
        trace!(method = %request.method, url = %url, "dispatching request");

        let mut builder = self.agent.request(request.method.as_str(), url);
        for header in &request.headers {
            builder = builder.set(&header.name, &header.value);
        }

        let result = match &request.body {
            Some(body) => {
                if request.header("Content-Type").is_none() {
                    builder = builder.set("Content-Type", &request.content_type);
                }
                builder.send_string(body)
            }
            None => builder.call(),
        };

        match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => read_response(response, url),
            Err(ureq::Error::Transport(transport)) => Err(map_transport_error(&transport, url)),
        }
    }
}

fn read_response(response: ureq::Response, url: &str) -> Result<ServiceResponse, TransportError> {
    let status = response.status();
    let mut headers = Vec::new();
    for name in response.headers_names() {
        for value in response.all(&name) {
            headers.push(Header::new(name.clone(), value));
        }
    }
    let body = response.into_string().map_err(|e| io_error(&e, url))?;
    trace!(status, url = %url, "received response");
    Ok(ServiceResponse {
        status,
        body,
        headers,
    })
}

fn map_transport_error(error: &ureq::Transport, url: &str) -> TransportError {
    let message = error.to_string();
    match error.kind() {
        ureq::ErrorKind::ConnectionFailed => TransportError::ConnectionRefused {
            url: url.to_string(),
        },
        ureq::ErrorKind::BadHeader => TransportError::Unsendable { reason: message },
        ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
            TransportError::InvalidRequest { reason: message }
        }
        _ if is_timeout(error) => TransportError::Timeout {
            url: url.to_string(),
        },
        _ => TransportError::Io {
            url: url.to_string(),
            message,
        },
    }
}

fn is_timeout(error: &ureq::Transport) -> bool {
    let source_timed_out = std::error::Error::source(error)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
        .unwrap_or(false);
    source_timed_out || error.to_string().contains("timed out")
}

pub(crate) fn io_error(error: &io::Error, url: &str) -> TransportError {
    if matches!(error.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Io {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
