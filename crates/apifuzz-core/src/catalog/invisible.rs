//! Field values made only of invisible characters.
//!
//! A service that trims input and then validates it must reject these; one
//! that validates before trimming lets them through.

use apifuzz_types::{FieldType, FuzzingStrategy, HttpMethod, ResponseCodeFamily};
use serde_json::Value;

use super::chars::{code_points, replacement_length, CONTROL_CHARS, WHITESPACES};
use super::{describe_fields, FieldFuzzer, GET_AND_DELETE};
use crate::error::FuzzError;

fn repeated_char_strategies(
    chars: &[&str],
    field: &FieldType,
    current: &Value,
) -> Vec<FuzzingStrategy> {
    let len = replacement_length(field, current);
    chars
        .iter()
        .map(|sequence| {
            FuzzingStrategy::replace(
                sequence.repeat(len),
                format!("replace value with {} repeated {} times", code_points(sequence), len),
            )
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OnlyWhitespacesInFieldsTrimValidateFuzzer;

impl FieldFuzzer for OnlyWhitespacesInFieldsTrimValidateFuzzer {
    fn name(&self) -> &'static str {
        "OnlyWhitespacesInFieldsTrimValidateFuzzer"
    }

    fn description(&self) -> String {
        describe_fields("values made only of unicode whitespaces")
    }

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        GET_AND_DELETE
    }

    fn is_applicable(&self, field: &FieldType) -> bool {
        field.is_string()
    }

    fn generate(
        &self,
        _field_path: &str,
        field: &FieldType,
        current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError> {
        Ok(repeated_char_strategies(WHITESPACES, field, current))
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }

    fn validates_response_schema(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OnlyControlCharsInFieldsTrimValidateFuzzer;

impl FieldFuzzer for OnlyControlCharsInFieldsTrimValidateFuzzer {
    fn name(&self) -> &'static str {
        "OnlyControlCharsInFieldsTrimValidateFuzzer"
    }

    fn description(&self) -> String {
        describe_fields("values made only of control characters")
    }

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        GET_AND_DELETE
    }

    fn is_applicable(&self, field: &FieldType) -> bool {
        field.is_string()
    }

    fn generate(
        &self,
        _field_path: &str,
        field: &FieldType,
        current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError> {
        Ok(repeated_char_strategies(CONTROL_CHARS, field, current))
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }

    fn validates_response_schema(&self) -> bool {
        false
    }
}
