//! Security-header differ.
//!
//! Sends each operation unmodified and checks the response for the
//! recommended security headers. Only header *names* are compared (ignoring
//! case); every declared `name: value` variant of a missing name is reported.

use std::collections::BTreeSet;

use apifuzz_types::{Header, ResponseCodeFamily, ServiceResponse};

use crate::catalog::{Finding, OperationFuzzer};

/// Recommended security headers, as `(name, value)`. A name may appear more
/// than once when several values are acceptable.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store"),
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("X-XSS-Protection", "0"),
];

pub const MISSING_SECURITY_HEADERS_TEMPLATE: &str = "Missing recommended Security Headers: {}";

/// `name: value` entries of [`SECURITY_HEADERS`] whose name is absent from
/// `response_headers`, sorted.
pub fn missing_security_headers(response_headers: &[Header]) -> BTreeSet<String> {
    SECURITY_HEADERS
        .iter()
        .filter(|(name, _)| !response_headers.iter().any(|h| h.has_name(name)))
        .map(|(name, value)| Header::new(*name, *value).name_and_value())
        .collect()
}

fn format_set(entries: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = entries.iter().map(String::as_str).collect();
    format!("[{}]", joined.join(", "))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CheckSecurityHeadersFuzzer;

impl OperationFuzzer for CheckSecurityHeadersFuzzer {
    fn name(&self) -> &'static str {
        "CheckSecurityHeadersFuzzer"
    }

    fn description(&self) -> String {
        let expected: Vec<String> = SECURITY_HEADERS
            .iter()
            .map(|(name, value)| Header::new(*name, *value).name_and_value())
            .collect();
        format!(
            "check all responses for good practices around Security related headers like: [{}]",
            expected.join(", ")
        )
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::TwoXx
    }

    fn inspect(&self, response: &ServiceResponse) -> Vec<Finding> {
        let missing = missing_security_headers(&response.headers);
        if missing.is_empty() {
            return Vec::new();
        }
        vec![Finding {
            template: MISSING_SECURITY_HEADERS_TEMPLATE,
            args: vec![format_set(&missing)],
        }]
    }
}
