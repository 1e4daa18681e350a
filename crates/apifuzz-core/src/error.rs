//! Error types of the fuzzing pipeline.
//!
//! Transport faults are not here: they come back from the
//! [`ServiceCaller`](apifuzz_types::ServiceCaller) as
//! [`TransportError`](apifuzz_types::TransportError) and become ERROR verdicts.

use std::fmt;

use apifuzz_types::ContractViolation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzError {
    /// A descriptor lacks data a fuzzer needs; the field is skipped.
    InvalidDescriptor {
        fuzzer: &'static str,
        field: String,
        reason: String,
    },
    /// The field path does not resolve inside the request payload.
    FieldNotInPayload { field: String },
    /// The contract entry cannot be used; the whole operation is aborted.
    MalformedContract(ContractViolation),
    /// Fuzzer selection names a fuzzer that does not exist.
    UnknownFuzzer { name: String },
}

impl fmt::Display for FuzzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuzzError::InvalidDescriptor {
                fuzzer,
                field,
                reason,
            } => write!(f, "{} cannot fuzz field '{}': {}", fuzzer, field, reason),
            FuzzError::FieldNotInPayload { field } => {
                write!(f, "field '{}' is not present in the request payload", field)
            }
            FuzzError::MalformedContract(violation) => write!(f, "{}", violation),
            FuzzError::UnknownFuzzer { name } => write!(f, "unknown fuzzer '{}'", name),
        }
    }
}

impl std::error::Error for FuzzError {}

impl From<ContractViolation> for FuzzError {
    fn from(violation: ContractViolation) -> Self {
        FuzzError::MalformedContract(violation)
    }
}
