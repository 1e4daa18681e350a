//! Enum value substitution.

use apifuzz_types::{FieldType, FuzzingStrategy, ResponseCodeFamily};
use serde_json::Value;

use super::FieldFuzzer;
use crate::error::FuzzError;

/// Sends every alternate literal of an enum field, one request each.
///
/// The literal already in the payload is the baseline; when the payload
/// holds something outside the enum, the first declared literal is. The
/// remaining K-1 literals are all valid, so the service must still succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct IterateThroughEnumValuesFieldsFuzzer;

impl FieldFuzzer for IterateThroughEnumValuesFieldsFuzzer {
    fn name(&self) -> &'static str {
        "IterateThroughEnumValuesFieldsFuzzer"
    }

    fn description(&self) -> String {
        "iterate through each enum field and send each of its other declared values".to_string()
    }

    fn is_applicable(&self, field: &FieldType) -> bool {
        field.enum_values().is_some()
    }

    fn requires_non_discriminator(&self) -> bool {
        true
    }

    fn generate(
        &self,
        _field_path: &str,
        field: &FieldType,
        current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError> {
        let Some(values) = field.enum_values() else {
            return Ok(Vec::new());
        };
        let baseline = if values.contains(current) {
            Some(current)
        } else {
            values.first()
        };

        Ok(values
            .iter()
            .filter(|value| Some(*value) != baseline)
            .map(|value| {
                let label = format!("replace with enum value {}", value);
                FuzzingStrategy::replace(value.clone(), label)
            })
            .collect())
    }

    fn expected_outcome(&self) -> ResponseCodeFamily {
        ResponseCodeFamily::TwoXx
    }
}
