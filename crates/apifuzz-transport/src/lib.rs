//! apifuzz Transport Layer
//!
//! Blocking HTTP transport behind the [`apifuzz_types::ServiceCaller`] seam.
//!
//! - [`http_caller`]: `ureq` agent with per-call timeouts
//! - [`raw`]: byte-exact HTTP/1.1 writer for header values `ureq` rejects
//!
//! # Example
//!
//! ```ignore
//! use apifuzz_transport::{HttpCallerConfig, HttpServiceCaller};
//!
//! let caller = HttpServiceCaller::new(&HttpCallerConfig::new("http://localhost:8080"));
//! let response = caller.call(&request)?;
//! ```

pub mod http_caller;
pub mod raw;

pub use http_caller::{HttpCallerConfig, HttpServiceCaller, DEFAULT_SERVER};
pub use raw::RawRequestWriter;
