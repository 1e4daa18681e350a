//! Structural conformance of a response body against a [`ResponseSchema`].
//!
//! Only what the classifier needs: types, required properties and nested
//! items. Undeclared properties are accepted.

use std::fmt;

use apifuzz_types::ResponseSchema;
use serde_json::Value;

/// First mismatch found, addressed by a `$.a.b[0]` style path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

pub fn check_conformance(schema: &ResponseSchema, body: &Value) -> Result<(), SchemaViolation> {
    check(schema, body, "$")
}

fn check(schema: &ResponseSchema, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let mismatch = |expected: &str| SchemaViolation {
        path: path.to_string(),
        reason: format!("expected {}, found {}", expected, type_name(value)),
    };

    match schema {
        ResponseSchema::Any => Ok(()),
        ResponseSchema::String if value.is_string() => Ok(()),
        ResponseSchema::String => Err(mismatch("string")),
        ResponseSchema::Integer if value.is_i64() || value.is_u64() => Ok(()),
        ResponseSchema::Integer => Err(mismatch("integer")),
        ResponseSchema::Number if value.is_number() => Ok(()),
        ResponseSchema::Number => Err(mismatch("number")),
        ResponseSchema::Boolean if value.is_boolean() => Ok(()),
        ResponseSchema::Boolean => Err(mismatch("boolean")),
        ResponseSchema::Array { items } => {
            let elements = value.as_array().ok_or_else(|| mismatch("array"))?;
            if let Some(items) = items {
                for (i, element) in elements.iter().enumerate() {
                    check(items, element, &format!("{}[{}]", path, i))?;
                }
            }
            Ok(())
        }
        ResponseSchema::Object {
            properties,
            required,
        } => {
            let object = value.as_object().ok_or_else(|| mismatch("object"))?;
            for name in required {
                if !object.contains_key(name) {
                    return Err(SchemaViolation {
                        path: path.to_string(),
                        reason: format!("missing required property '{}'", name),
                    });
                }
            }
            for (name, property) in properties {
                if let Some(child) = object.get(name) {
                    check(property, child, &format!("{}.{}", path, name))?;
                }
            }
            Ok(())
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
