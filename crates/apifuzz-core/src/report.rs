//! Test case reporting.
//!
//! The executor emits one [`TestCase`] per dispatched strategy through a
//! [`TestCaseReporter`]. [`CollectingReporter`] keeps everything in memory for
//! the CLI's console and JSON output; [`RunSummary`] is the aggregate the exit
//! status is derived from.

use std::collections::BTreeSet;
use std::fmt;

use apifuzz_types::{
    FuzzingStrategy, OperationView, ResponseCodeFamily, ServiceRequest, ServiceResponse,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::classifier::Verdict;

/// Deterministic test case id: operation index in the contract, then the
/// position of the case within that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestCaseId {
    pub operation: usize,
    pub sequence: u32,
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test {}.{}", self.operation, self.sequence)
    }
}

/// Hands out [`TestCaseId`]s for one operation, in emission order.
#[derive(Debug, Clone)]
pub struct TestSequence {
    operation: usize,
    next: u32,
}

impl TestSequence {
    pub fn new(operation: usize) -> Self {
        Self { operation, next: 1 }
    }

    pub fn next_id(&mut self) -> TestCaseId {
        let id = TestCaseId {
            operation: self.operation,
            sequence: self.next,
        };
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}

/// What a test case mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum TestTarget {
    Field { path: String },
    Header { name: String },
    Operation,
}

impl fmt::Display for TestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestTarget::Field { path } => write!(f, "field {}", path),
            TestTarget::Header { name } => write!(f, "header {}", name),
            TestTarget::Operation => write!(f, "operation"),
        }
    }
}

/// Identity of a test case, shared by its result and any diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestContext {
    pub id: TestCaseId,
    /// `METHOD /path` of the operation.
    pub operation: String,
    pub fuzzer: String,
    #[serde(flatten)]
    pub target: TestTarget,
    pub expected: ResponseCodeFamily,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(flatten)]
    pub context: TestContext,
    pub strategy: FuzzingStrategy,
    /// Absent for skipped targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ServiceRequest>,
    /// Absent when nothing was dispatched or the transport failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ServiceResponse>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// An error raised about a test case beyond its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub context: TestContext,
    pub message: String,
}

/// Receives test cases as the executor produces them.
///
/// Implementations are shared across worker threads.
pub trait TestCaseReporter: Send + Sync {
    fn report_result(&self, operation: &OperationView, case: TestCase);

    /// Report a diagnostic; `template` uses `{}` placeholders filled from
    /// `args` in order.
    fn report_error(&self, context: &TestContext, template: &str, args: &[String]);

    /// `false` when `path` is a polymorphic discriminator that must not be
    /// mutated.
    fn is_field_not_a_discriminator(&self, path: &str) -> bool;
}

/// Substitute `{}` placeholders in order. Extra placeholders are left as is,
/// extra arguments are ignored.
pub fn render_template(template: &str, args: &[String]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        rendered.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => rendered.push_str(arg),
            None => rendered.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    rendered.push_str(rest);
    rendered
}

/// Keeps every test case and diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    discriminators: BTreeSet<String>,
    cases: Mutex<Vec<TestCase>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new<I, S>(discriminators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            discriminators: discriminators.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Test cases sorted by id.
    pub fn test_cases(&self) -> Vec<TestCase> {
        let mut cases = self.cases.lock().clone();
        cases.sort_by_key(|c| c.context.id);
        cases
    }

    /// Diagnostics sorted by the id of the test case they concern.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().clone();
        diagnostics.sort_by_key(|d| d.context.id);
        diagnostics
    }
}

impl TestCaseReporter for CollectingReporter {
    fn report_result(&self, _operation: &OperationView, case: TestCase) {
        self.cases.lock().push(case);
    }

    fn report_error(&self, context: &TestContext, template: &str, args: &[String]) {
        self.diagnostics.lock().push(Diagnostic {
            context: context.clone(),
            message: render_template(template, args),
        });
    }

    fn is_field_not_a_discriminator(&self, path: &str) -> bool {
        !self.discriminators.contains(path)
    }
}

/// Verdict tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl VerdictCounts {
    pub fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail { .. } => self.failed += 1,
            Verdict::Error { .. } => self.errored += 1,
            Verdict::Skip { .. } => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }
}

/// An operation that was not fuzzed because its contract entry is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortedOperation {
    pub index: usize,
    pub operation: String,
    pub reason: String,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub operations: usize,
    #[serde(flatten)]
    pub verdicts: VerdictCounts,
    pub diagnostics: usize,
    pub aborted: Vec<AbortedOperation>,
    /// The run stopped early (Ctrl-C or fail-fast).
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Anything that should make the CLI exit non-zero.
    pub fn has_failures(&self) -> bool {
        self.verdicts.failed > 0
            || self.verdicts.errored > 0
            || self.diagnostics > 0
            || !self.aborted.is_empty()
    }
}
