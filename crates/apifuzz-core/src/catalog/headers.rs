//! Invisible characters injected into request headers.

use apifuzz_types::{FuzzingStrategy, Header, ResponseCodeFamily};

use super::chars::{code_points, CONTROL_CHARS, WHITESPACES};
use super::{describe_headers, HeaderFuzzer};

/// Replaces each header value with a single unicode separator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnlyWhitespacesInHeadersFuzzer;

impl HeaderFuzzer for OnlyWhitespacesInHeadersFuzzer {
    fn name(&self) -> &'static str {
        "OnlyWhitespacesInHeadersFuzzer"
    }

    fn description(&self) -> String {
        describe_headers("replace value with unicode separators")
    }

    fn generate(&self, _header: &Header) -> Vec<FuzzingStrategy> {
        WHITESPACES
            .iter()
            .map(|c| FuzzingStrategy::replace(*c, format!("replace value with {}", code_points(c))))
            .collect()
    }

    fn expected_outcome(&self, _header: &Header) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }
}

/// Appends control characters to each header value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrailingControlCharsInHeadersFuzzer;

impl HeaderFuzzer for TrailingControlCharsInHeadersFuzzer {
    fn name(&self) -> &'static str {
        "TrailingControlCharsInHeadersFuzzer"
    }

    fn description(&self) -> String {
        describe_headers("trail values with control chars")
    }

    fn generate(&self, _header: &Header) -> Vec<FuzzingStrategy> {
        CONTROL_CHARS
            .iter()
            .map(|c| FuzzingStrategy::trail(*c, format!("trail value with {}", code_points(c))))
            .collect()
    }

    fn expected_outcome(&self, _header: &Header) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }
}

/// Prepends control characters to each header value.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeadingControlCharsInHeadersFuzzer;

impl HeaderFuzzer for LeadingControlCharsInHeadersFuzzer {
    fn name(&self) -> &'static str {
        "LeadingControlCharsInHeadersFuzzer"
    }

    fn description(&self) -> String {
        describe_headers("prefix values with control chars")
    }

    fn generate(&self, _header: &Header) -> Vec<FuzzingStrategy> {
        CONTROL_CHARS
            .iter()
            .map(|c| FuzzingStrategy::prefix(*c, format!("prefix value with {}", code_points(c))))
            .collect()
    }

    fn expected_outcome(&self, _header: &Header) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }
}
