//! Removal of single fields and headers.

use apifuzz_types::{FieldType, FuzzingStrategy, Header, HttpMethod, ResponseCodeFamily};
use serde_json::Value;

use super::{describe_fields, describe_headers, FieldFuzzer, HeaderFuzzer, NON_BODY_METHODS};
use crate::error::FuzzError;

/// Drops one required body field per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveRequiredFieldsFuzzer;

impl FieldFuzzer for RemoveRequiredFieldsFuzzer {
    fn name(&self) -> &'static str {
        "RemoveRequiredFieldsFuzzer"
    }

    fn description(&self) -> String {
        describe_fields("requests without one of the required fields")
    }

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        NON_BODY_METHODS
    }

    fn is_applicable(&self, field: &FieldType) -> bool {
        field.required
    }

    fn generate(
        &self,
        field_path: &str,
        _field: &FieldType,
        _current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError> {
        Ok(vec![FuzzingStrategy::skip(format!(
            "remove required field {}",
            field_path
        ))])
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }

    fn validates_response_schema(&self) -> bool {
        false
    }
}

/// Drops one header per request: required headers must be rejected, optional
/// ones must not matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveHeadersFuzzer;

impl HeaderFuzzer for RemoveHeadersFuzzer {
    fn name(&self) -> &'static str {
        "RemoveHeadersFuzzer"
    }

    fn description(&self) -> String {
        describe_headers("send the request without it")
    }

    fn generate(&self, header: &Header) -> Vec<FuzzingStrategy> {
        vec![FuzzingStrategy::skip(format!("remove header {}", header.name))]
    }

    fn expected_outcome(&self, header: &Header) -> ResponseCodeFamily {
        if header.required {
            ResponseCodeFamily::FourXx
        } else {
            ResponseCodeFamily::TwoXx
        }
    }
}
