//! Response classification.
//!
//! Turns the outcome of one dispatched request into a [`Verdict`] by checking
//! the status-code family and, when asked to, the declared response schema.
//! Classification never panics: inputs it cannot make sense of are a FAIL
//! with a diagnostic message.

use apifuzz_types::{ResponseCodeFamily, ResponseSchema, ServiceResponse, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::check_conformance;

/// Outcome assigned to one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    /// The service violated the expected contract.
    Fail { message: String },
    /// The service could not be exercised (transport fault).
    Error { message: String },
    /// The target was intentionally not exercised.
    Skip { reason: String },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// FAIL and ERROR both count against the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail { .. } | Verdict::Error { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail { .. } => "FAIL",
            Verdict::Error { .. } => "ERROR",
            Verdict::Skip { .. } => "SKIP",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { message } | Verdict::Error { message } => Some(message),
            Verdict::Skip { reason } => Some(reason),
        }
    }
}

/// Classify one dispatch outcome against the expected family.
pub fn classify(
    expected: ResponseCodeFamily,
    outcome: Result<&ServiceResponse, &TransportError>,
    schema: Option<&ResponseSchema>,
    validate_schema: bool,
) -> Verdict {
    let response = match outcome {
        Ok(response) => response,
        Err(TransportError::Unsendable { reason }) => {
            return Verdict::Skip {
                reason: reason.clone(),
            }
        }
        Err(fault) => {
            return Verdict::Error {
                message: fault.to_string(),
            }
        }
    };

    if !ResponseCodeFamily::is_valid_status(response.status) {
        return Verdict::Fail {
            message: format!(
                "Service returned invalid HTTP status code {}; expected {}",
                response.status, expected
            ),
        };
    }

    if !expected.matches(response.status) {
        return Verdict::Fail {
            message: format!(
                "Call returned unexpected HTTP status code {}; expected {}",
                response.status, expected
            ),
        };
    }

    if validate_schema {
        if let Some(schema) = schema {
            let body: Value = match serde_json::from_str(&response.body) {
                Ok(body) => body,
                Err(e) => {
                    return Verdict::Fail {
                        message: format!("Response body is not valid JSON: {}", e),
                    }
                }
            };
            if let Err(violation) = check_conformance(schema, &body) {
                return Verdict::Fail {
                    message: format!(
                        "Response body does not match the declared schema at {}",
                        violation
                    ),
                };
            }
        }
    }

    Verdict::Pass
}
