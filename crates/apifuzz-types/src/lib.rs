//! Shared types for the apifuzz workspace.
//!
//! This crate holds the data model every other crate speaks:
//!
//! - [`operation`]: the read-only [`OperationView`] of one contract operation
//!   and its [`FieldType`] descriptors
//! - [`strategy`]: [`FuzzingStrategy`], one concrete mutation
//! - [`http`]: methods, headers and [`ResponseCodeFamily`]
//! - [`exchange`]: request/response types and the [`ServiceCaller`] seam
//! - [`env_utils`]: environment-variable configuration helpers

pub mod env_utils;
pub mod exchange;
pub mod http;
pub mod operation;
pub mod strategy;

pub use exchange::{ServiceCaller, ServiceRequest, ServiceResponse, TransportError};
pub use http::{Header, HttpMethod, ResponseCodeFamily};
pub use operation::{
    ContractViolation, FieldKind, FieldType, OperationView, PrimitiveType, ResponseSchema,
    FIELD_PATH_SEPARATOR,
};
pub use strategy::{FuzzingStrategy, StrategyKind};
