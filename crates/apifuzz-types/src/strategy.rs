//! Fuzzing strategies: one concrete mutation of one field or header.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a strategy's value is combined with the targeted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyKind {
    /// Leave the request untouched.
    Noop,
    /// Substitute the value entirely.
    Replace,
    /// Append to the existing value.
    Trail,
    /// Prepend to the existing value.
    Prefix,
    /// Remove the field or header.
    Skip,
}

/// A `(kind, value, label)` triple produced by a fuzzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzingStrategy {
    pub kind: StrategyKind,
    pub value: Value,
    /// Human-readable description used in reports.
    pub label: String,
}

impl FuzzingStrategy {
    pub fn noop() -> Self {
        Self {
            kind: StrategyKind::Noop,
            value: Value::Null,
            label: "send request unmodified".to_string(),
        }
    }

    pub fn replace(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            kind: StrategyKind::Replace,
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn trail(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            kind: StrategyKind::Trail,
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn prefix(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            kind: StrategyKind::Prefix,
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn skip(label: impl Into<String>) -> Self {
        Self {
            kind: StrategyKind::Skip,
            value: Value::Null,
            label: label.into(),
        }
    }

    /// The strategy value as text, for string concatenation and headers.
    pub fn value_as_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FuzzingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.label)
    }
}
