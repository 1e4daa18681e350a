//! JSON contract files.
//!
//! ```json
//! {
//!   "discriminators": ["pet#petType"],
//!   "operations": [
//!     {"path": "/pets", "method": "POST", "payload": {"name": "rex"},
//!      "fields": {"name": {"kind": "primitive", "type": "string", "required": true}}}
//!   ]
//! }
//! ```
//!
//! Each operation is decoded and validated on its own, so one bad entry only
//! takes that operation out of the run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use apifuzz_core::{ContractEntry, ContractSource};
use apifuzz_types::{ContractViolation, OperationView};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ContractDocument {
    #[serde(default)]
    discriminators: Vec<String>,
    operations: Vec<Value>,
}

/// A contract read from a JSON file.
#[derive(Debug)]
pub struct JsonContractSource {
    document: ContractDocument,
}

impl JsonContractSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract {}", path.display()))?;
        let document: ContractDocument = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse contract {}", path.display()))?;
        debug!(
            path = %path.display(),
            operations = document.operations.len(),
            "Loaded contract"
        );
        Ok(Self { document })
    }
}

impl ContractSource for JsonContractSource {
    fn load(&self) -> Result<Vec<ContractEntry>> {
        Ok(self
            .document
            .operations
            .iter()
            .enumerate()
            .map(|(index, raw)| decode_operation(index, raw))
            .collect())
    }

    fn discriminators(&self) -> Result<Vec<String>> {
        Ok(self.document.discriminators.clone())
    }
}

fn decode_operation(index: usize, raw: &Value) -> ContractEntry {
    let decoded = serde_json::from_value::<OperationView>(raw.clone())
        .map_err(|e| ContractViolation {
            operation: describe_raw(index, raw),
            reason: e.to_string(),
        })
        .and_then(|view| view.validate().map(|()| view));

    match decoded {
        Ok(view) => ContractEntry::Ready(view),
        Err(violation) => {
            warn!("Contract entry {} is unusable: {}", index, violation);
            ContractEntry::Malformed(violation)
        }
    }
}

/// Best-effort `METHOD /path` of an entry that failed to decode.
fn describe_raw(index: usize, raw: &Value) -> String {
    match (
        raw.get("method").and_then(Value::as_str),
        raw.get("path").and_then(Value::as_str),
    ) {
        (Some(method), Some(path)) => format!("{} {}", method, path),
        _ => format!("operation #{}", index),
    }
}
