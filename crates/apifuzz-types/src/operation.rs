//! Normalized view of one contract operation.
//!
//! An [`OperationView`] is produced once per `(path, method)` by the contract
//! source and is read-only from then on: fuzzers only ever work on clones of
//! its payload and header list.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{Header, HttpMethod};

/// Separator between segments of a fully-qualified field path.
pub const FIELD_PATH_SEPARATOR: char = '#';

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Primitive JSON types a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

/// Shape of a field as declared by the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Primitive {
        #[serde(rename = "type")]
        primitive: PrimitiveType,
    },
    Object,
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    Enum {
        values: Vec<Value>,
    },
}

/// Field-type descriptor attached to every field path of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Selects a polymorphic subtype; never value-substituted.
    #[serde(default)]
    pub discriminator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldType {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            discriminator: false,
            min_length: None,
            max_length: None,
        }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::of(FieldKind::Primitive { primitive })
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn object() -> Self {
        Self::of(FieldKind::Object)
    }

    pub fn array(min_items: Option<usize>, max_items: Option<usize>) -> Self {
        Self::of(FieldKind::Array {
            min_items,
            max_items,
        })
    }

    /// Enum descriptor; duplicate literals are dropped, first occurrence wins.
    pub fn enumeration<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut unique: Vec<Value> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self::of(FieldKind::Enum { values: unique })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn discriminator(mut self) -> Self {
        self.discriminator = true;
        self
    }

    pub fn with_length(mut self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, FieldKind::Array { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Primitive {
                primitive: PrimitiveType::String
            }
        )
    }

    pub fn enum_values(&self) -> Option<&[Value]> {
        match &self.kind {
            FieldKind::Enum { values } => Some(values),
            _ => None,
        }
    }

    pub fn max_items(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Array { max_items, .. } => max_items,
            _ => None,
        }
    }
}

/// Declared shape of a successful response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseSchema {
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ResponseSchema>,
        #[serde(default)]
        required: Vec<String>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<ResponseSchema>>,
    },
    String,
    Integer,
    Number,
    Boolean,
    Any,
}

/// Contract data that cannot be turned into a usable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub operation: String,
    pub reason: String,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed operation {}: {}", self.operation, self.reason)
    }
}

impl std::error::Error for ContractViolation {}

/// Read-only description of one `(path, method)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationView {
    path: String,
    method: HttpMethod,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    fields: BTreeMap<String, FieldType>,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    request_content_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_schema: Option<ResponseSchema>,
}

impl OperationView {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            payload: Value::Null,
            fields: BTreeMap::new(),
            headers: Vec::new(),
            request_content_types: Vec::new(),
            response_schema: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_field(mut self, path: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(path.into(), field_type);
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request_content_types.push(content_type.into());
        self
    }

    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// All field descriptors, ordered by field path.
    pub fn fields(&self) -> &BTreeMap<String, FieldType> {
        &self.fields
    }

    pub fn field_type(&self, path: &str) -> Option<&FieldType> {
        self.fields.get(path)
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn request_content_types(&self) -> &[String] {
        &self.request_content_types
    }

    /// Content type used when dispatching; the first declared one wins.
    pub fn content_type(&self) -> &str {
        self.request_content_types
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn response_schema(&self) -> Option<&ResponseSchema> {
        self.response_schema.as_ref()
    }

    /// `METHOD /path`, used in logs and reports.
    pub fn id(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Check the structural constraints the fuzzers rely on.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        let violation = |reason: String| ContractViolation {
            operation: self.id(),
            reason,
        };

        if !self.path.starts_with('/') {
            return Err(violation(format!("path '{}' must start with '/'", self.path)));
        }

        for (field_path, field_type) in &self.fields {
            if field_path
                .split(FIELD_PATH_SEPARATOR)
                .any(|segment| segment.is_empty())
            {
                return Err(violation(format!("invalid field path '{}'", field_path)));
            }
            match &field_type.kind {
                FieldKind::Enum { values } => {
                    if values.is_empty() {
                        return Err(violation(format!(
                            "enum field '{}' declares no values",
                            field_path
                        )));
                    }
                    for (i, value) in values.iter().enumerate() {
                        if values[..i].contains(value) {
                            return Err(violation(format!(
                                "enum field '{}' repeats value {}",
                                field_path, value
                            )));
                        }
                    }
                }
                FieldKind::Array {
                    min_items: Some(min),
                    max_items: Some(max),
                } if min > max => {
                    return Err(violation(format!(
                        "array field '{}' has min_items {} > max_items {}",
                        field_path, min, max
                    )));
                }
                _ => {}
            }
            if let (Some(min), Some(max)) = (field_type.min_length, field_type.max_length) {
                if min > max {
                    return Err(violation(format!(
                        "field '{}' has min_length {} > max_length {}",
                        field_path, min, max
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for header in &self.headers {
            if header.name.trim().is_empty() {
                return Err(violation("header with empty name".to_string()));
            }
            if !seen.insert(header.name.to_ascii_lowercase()) {
                return Err(violation(format!("duplicate header '{}'", header.name)));
            }
        }

        Ok(())
    }
}
