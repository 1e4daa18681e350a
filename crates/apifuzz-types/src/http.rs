//! HTTP vocabulary shared by the contract, the fuzzers and the transport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HTTP method of an operation under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether requests with this method carry the operation payload as a body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("unknown HTTP method '{}'", other)),
        }
    }
}

/// A single header as declared by the contract or returned by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
    /// Whether the contract marks the header as mandatory.
    #[serde(default)]
    pub required: bool,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            required: false,
        }
    }

    pub fn required(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::new(name, value)
        }
    }

    /// Header names compare case-insensitively on the wire.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `name: value`, the form used in diagnostics.
    pub fn name_and_value(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }
}

/// Class of HTTP status codes a mutated request is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCodeFamily {
    #[serde(rename = "2XX")]
    TwoXx,
    #[serde(rename = "4XX")]
    FourXx,
    #[serde(rename = "5XX")]
    FiveXx,
    #[serde(rename = "ANY")]
    Any,
}

impl ResponseCodeFamily {
    /// Whether `code` is a valid HTTP status at all (100-599).
    pub fn is_valid_status(code: u16) -> bool {
        (100..=599).contains(&code)
    }

    pub fn matches(&self, code: u16) -> bool {
        match self {
            ResponseCodeFamily::TwoXx => (200..=299).contains(&code),
            ResponseCodeFamily::FourXx => (400..=499).contains(&code),
            ResponseCodeFamily::FiveXx => (500..=599).contains(&code),
            ResponseCodeFamily::Any => Self::is_valid_status(code),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCodeFamily::TwoXx => "2XX",
            ResponseCodeFamily::FourXx => "4XX",
            ResponseCodeFamily::FiveXx => "5XX",
            ResponseCodeFamily::Any => "ANY",
        }
    }
}

impl fmt::Display for ResponseCodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
