//! Request/response exchange with the service under test.
//!
//! [`ServiceCaller`] is the single blocking seam of the fuzzing pipeline:
//! everything above it is pure, everything below it is transport.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::http::{Header, HttpMethod};

/// A fully-built request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub method: HttpMethod,
    /// Operation path relative to the service base URL.
    pub path: String,
    /// Query parameters in order; repeated names are sent repeatedly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub content_type: String,
}

impl ServiceRequest {
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.has_name(name))
    }

    /// Values of every query parameter called `name`.
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// What the service answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

impl ServiceResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }
}

/// The service could not be reached or did not answer in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    ConnectionRefused { url: String },
    Timeout { url: String },
    /// The request could not be built (bad URL or scheme).
    InvalidRequest { reason: String },
    /// The mutated request cannot be put on the wire by this transport, so
    /// the service never saw it.
    Unsendable { reason: String },
    Io { url: String, message: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionRefused { url } => {
                write!(f, "connection refused: {}", url)
            }
            TransportError::Timeout { url } => write!(f, "request timed out: {}", url),
            TransportError::InvalidRequest { reason } => {
                write!(f, "request could not be sent: {}", reason)
            }
            TransportError::Unsendable { reason } => {
                write!(f, "request cannot be sent as mutated: {}", reason)
            }
            TransportError::Io { url, message } => {
                write!(f, "transport failure calling {}: {}", url, message)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Sends requests to the service under test.
///
/// Implementations own timeouts and any retry policy; callers treat an
/// `Err` as a transport-level fault, never as a service verdict.
pub trait ServiceCaller: Send + Sync {
    fn call(&self, request: &ServiceRequest) -> Result<ServiceResponse, TransportError>;
}
