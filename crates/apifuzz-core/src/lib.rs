//! Contract-driven HTTP API fuzzing engine.
//!
//! Given [`OperationView`](apifuzz_types::OperationView)s and a
//! [`ServiceCaller`](apifuzz_types::ServiceCaller), this crate mutates one
//! field or header at a time, dispatches each mutated request and classifies
//! the response against what a correct service should answer.
//!
//! - [`catalog`]: fuzzer policies (what to send, what to expect)
//! - [`mutation`]: applying a strategy to a copy of the payload or headers
//! - [`executor`]: per-operation iteration and dispatch
//! - [`classifier`] / [`schema`]: response verdicts
//! - [`security_headers`]: the whole-operation security-header differ
//! - [`registry`] / [`runner`]: fuzzer selection and the concurrent run loop
//! - [`report`]: test cases, reporters and the run summary
//!
//! # Example
//!
//! ```no_run
//! use apifuzz_core::{
//!     CancellationToken, CollectingReporter, ContractEntry, FuzzRunner, FuzzerRegistry,
//! };
//! use apifuzz_types::{
//!     HttpMethod, OperationView, ServiceCaller, ServiceRequest, ServiceResponse, TransportError,
//! };
//!
//! struct AlwaysOk;
//!
//! impl ServiceCaller for AlwaysOk {
//!     fn call(&self, _request: &ServiceRequest) -> Result<ServiceResponse, TransportError> {
//!         Ok(ServiceResponse::new(200, "{}"))
//!     }
//! }
//!
//! let registry = FuzzerRegistry::all();
//! let reporter = CollectingReporter::new(Vec::<String>::new());
//! let entries = vec![ContractEntry::from(OperationView::new("/pets", HttpMethod::Get))];
//! let summary = FuzzRunner::new(&registry, &AlwaysOk)
//!     .run(&entries, &reporter, &CancellationToken::new())
//!     .unwrap();
//! println!("{} test cases", summary.verdicts.total());
//! ```

pub mod cancel;
pub mod catalog;
pub mod classifier;
pub mod contract;
pub mod error;
pub mod executor;
pub mod mutation;
pub mod registry;
pub mod report;
pub mod runner;
pub mod schema;
pub mod security_headers;

pub use cancel::CancellationToken;
pub use classifier::{classify, Verdict};
pub use contract::{ContractEntry, ContractSource, StaticContract};
pub use error::FuzzError;
pub use executor::{Executor, ExecutorConfig};
pub use registry::{Fuzzer, FuzzerRegistry, FuzzerSelection};
pub use report::{
    AbortedOperation, CollectingReporter, Diagnostic, RunSummary, TestCase, TestCaseId,
    TestCaseReporter, TestContext, TestSequence, TestTarget, VerdictCounts,
};
pub use runner::{FuzzRunner, RunConfig};
pub use security_headers::CheckSecurityHeadersFuzzer;
