//! Array size overflow.

use apifuzz_types::{FieldType, FuzzingStrategy, HttpMethod, ResponseCodeFamily};
use serde_json::Value;

use super::{FieldFuzzer, NON_BODY_METHODS};
use crate::error::FuzzError;

/// Declared maximums at or above this are not overflowed.
pub const MAX_OVERFLOW_ARRAY_SIZE: usize = 10_000;

/// Replaces array fields with an array one element longer than `max_items`.
///
/// The oversized array cycles through the field's current elements so that
/// each item stays structurally valid; only the size is wrong.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverflowArraySizeFieldsFuzzer;

impl FieldFuzzer for OverflowArraySizeFieldsFuzzer {
    fn name(&self) -> &'static str {
        "OverflowArraySizeFieldsFuzzer"
    }

    fn description(&self) -> String {
        "iterate through each array field and replace it with an array exceeding the declared \
         maxItems"
            .to_string()
    }

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        NON_BODY_METHODS
    }

    fn is_applicable(&self, field: &FieldType) -> bool {
        field.is_array()
    }

    fn generate(
        &self,
        field_path: &str,
        field: &FieldType,
        current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError> {
        let invalid = |reason: String| FuzzError::InvalidDescriptor {
            fuzzer: self.name(),
            field: field_path.to_string(),
            reason,
        };

        let max_items = field
            .max_items()
            .ok_or_else(|| invalid("array declares no max_items".to_string()))?;
        if max_items >= MAX_OVERFLOW_ARRAY_SIZE {
            return Err(invalid(format!(
                "max_items {} is too large to overflow",
                max_items
            )));
        }

        let size = max_items + 1;
        let placeholder = [Value::Null];
        let seed: &[Value] = match current.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => &placeholder,
        };
        let oversized: Vec<Value> = seed.iter().cycle().take(size).cloned().collect();

        Ok(vec![FuzzingStrategy::replace(
            Value::Array(oversized),
            format!("overflow array to {} elements (maxItems {})", size, max_items),
        )])
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::FourXx
    }

    fn validates_response_schema(&self) -> bool {
        false
    }
}
