#![allow(dead_code)]
//! Shared test doubles for the engine integration tests.
//!
//! - [`MockCaller`]: in-process service that records every request
//! - [`RecordingReporter`]: reporter that records every interaction,
//!   including discriminator queries

use std::collections::BTreeSet;

use apifuzz_core::{TestCase, TestCaseReporter, TestContext};
use apifuzz_types::{
    Header, OperationView, ServiceCaller, ServiceRequest, ServiceResponse, TransportError,
};
use parking_lot::Mutex;

type Responder =
    Box<dyn Fn(&ServiceRequest) -> Result<ServiceResponse, TransportError> + Send + Sync>;

pub struct MockCaller {
    responder: Responder,
    requests: Mutex<Vec<ServiceRequest>>,
}

impl MockCaller {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ServiceRequest) -> Result<ServiceResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `status` with an empty JSON object.
    pub fn status(status: u16) -> Self {
        Self::new(move |_| Ok(ServiceResponse::new(status, "{}")))
    }

    pub fn with_headers(status: u16, headers: Vec<Header>) -> Self {
        Self::new(move |_| Ok(ServiceResponse::new(status, "{}").with_headers(headers.clone())))
    }

    pub fn refusing() -> Self {
        Self::new(|_| {
            Err(TransportError::ConnectionRefused {
                url: "http://127.0.0.1:9".to_string(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().clone()
    }
}

impl ServiceCaller for MockCaller {
    fn call(&self, request: &ServiceRequest) -> Result<ServiceResponse, TransportError> {
        self.requests.lock().push(request.clone());
        (self.responder)(request)
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub discriminators: BTreeSet<String>,
    pub cases: Mutex<Vec<TestCase>>,
    pub errors: Mutex<Vec<(TestContext, String, Vec<String>)>>,
    pub discriminator_queries: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discriminator(mut self, path: &str) -> Self {
        self.discriminators.insert(path.to_string());
        self
    }

    pub fn cases(&self) -> Vec<TestCase> {
        self.cases.lock().clone()
    }

    pub fn errors(&self) -> Vec<(TestContext, String, Vec<String>)> {
        self.errors.lock().clone()
    }

    /// Results, diagnostics and discriminator queries together.
    pub fn interactions(&self) -> usize {
        self.cases.lock().len() + self.errors.lock().len() + self.discriminator_queries.lock().len()
    }
}

impl TestCaseReporter for RecordingReporter {
    fn report_result(&self, _operation: &OperationView, case: TestCase) {
        self.cases.lock().push(case);
    }

    fn report_error(&self, context: &TestContext, template: &str, args: &[String]) {
        self.errors
            .lock()
            .push((context.clone(), template.to_string(), args.to_vec()));
    }

    fn is_field_not_a_discriminator(&self, path: &str) -> bool {
        self.discriminator_queries.lock().push(path.to_string());
        !self.discriminators.contains(path)
    }
}
