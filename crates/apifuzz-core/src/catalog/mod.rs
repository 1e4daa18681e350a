//! Strategy catalog.
//!
//! Every fuzzer is a small policy value implementing one of three traits:
//!
//! - [`FieldFuzzer`]: mutates one request-body field at a time
//! - [`HeaderFuzzer`]: mutates one request header at a time
//! - [`OperationFuzzer`]: sends the operation unmodified and inspects the
//!   response as a whole
//!
//! Policies only decide *what* to send and *what to expect*; iterating,
//! dispatching and reporting is the executor's job. `generate` must be pure
//! and deterministic so that runs are reproducible.

pub mod arrays;
pub mod chars;
pub mod enums;
pub mod headers;
pub mod invisible;
pub mod remove;

use apifuzz_types::{
    FieldType, FuzzingStrategy, Header, HttpMethod, ResponseCodeFamily, ServiceResponse,
};
use serde_json::Value;

use crate::error::FuzzError;

pub use arrays::OverflowArraySizeFieldsFuzzer;
pub use enums::IterateThroughEnumValuesFieldsFuzzer;
pub use headers::{
    LeadingControlCharsInHeadersFuzzer, OnlyWhitespacesInHeadersFuzzer,
    TrailingControlCharsInHeadersFuzzer,
};
pub use invisible::{
    OnlyControlCharsInFieldsTrimValidateFuzzer, OnlyWhitespacesInFieldsTrimValidateFuzzer,
};
pub use remove::{RemoveHeadersFuzzer, RemoveRequiredFieldsFuzzer};

/// Methods whose requests carry no body to mutate.
pub const NON_BODY_METHODS: &[HttpMethod] =
    &[HttpMethod::Get, HttpMethod::Delete, HttpMethod::Head];

/// Exclusions of the trim-and-validate field fuzzers.
pub const GET_AND_DELETE: &[HttpMethod] = &[HttpMethod::Get, HttpMethod::Delete];

/// Policy that fuzzes one body field at a time.
pub trait FieldFuzzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    /// Operations with these methods are not fuzzed at all.
    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        &[]
    }

    fn is_applicable(&self, field: &FieldType) -> bool;

    /// Discriminator fields must be left alone by this fuzzer.
    fn requires_non_discriminator(&self) -> bool {
        false
    }

    /// Strategies for one field, in dispatch order. An empty list skips the
    /// field; an error skips it too and is logged.
    fn generate(
        &self,
        field_path: &str,
        field: &FieldType,
        current: &Value,
    ) -> Result<Vec<FuzzingStrategy>, FuzzError>;

    fn expected_outcome(&self) -> ResponseCodeFamily;

    /// Whether the body must also match the declared response schema.
    fn validates_response_schema(&self) -> bool {
        true
    }
}

/// Policy that fuzzes one request header at a time.
pub trait HeaderFuzzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        &[]
    }

    fn is_applicable(&self, _header: &Header) -> bool {
        true
    }

    fn generate(&self, header: &Header) -> Vec<FuzzingStrategy>;

    /// May depend on whether the header is required.
    fn expected_outcome(&self, header: &Header) -> ResponseCodeFamily;

    /// The declared schema describes success bodies only.
    fn validates_response_schema(&self, header: &Header) -> bool {
        self.expected_outcome(header) == ResponseCodeFamily::TwoXx
    }
}

/// Something an [`OperationFuzzer`] noticed about a response, reported as a
/// diagnostic error through `report_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Message with `{}` placeholders.
    pub template: &'static str,
    pub args: Vec<String>,
}

/// Policy that sends the operation unmodified and inspects the response.
pub trait OperationFuzzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    fn skip_for_methods(&self) -> &'static [HttpMethod] {
        &[]
    }

    fn expected_outcome(&self) -> ResponseCodeFamily;

    fn inspect(&self, response: &ServiceResponse) -> Vec<Finding>;
}

/// Shared wording of field fuzzer descriptions.
pub(crate) fn describe_fields(what: &str) -> String {
    format!("iterate through each field and send {}", what)
}

/// Shared wording of header fuzzer descriptions.
pub(crate) fn describe_headers(what: &str) -> String {
    format!("iterate through each header and {}", what)
}
