//! Run loop: every registered fuzzer over every contract operation.
//!
//! Operations run concurrently on a rayon pool; within one operation the
//! fuzzers run sequentially in registry order, sharing a [`TestSequence`] so
//! test case ids are deterministic regardless of scheduling.

use std::time::Instant;

use anyhow::{anyhow, Result};
use apifuzz_types::{OperationView, ServiceCaller};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::contract::ContractEntry;
use crate::error::FuzzError;
use crate::executor::{Executor, ExecutorConfig};
use crate::registry::{Fuzzer, FuzzerRegistry};
use crate::report::{
    AbortedOperation, RunSummary, TestCase, TestCaseReporter, TestContext, TestSequence,
    VerdictCounts,
};

/// Configuration for a fuzz run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Worker threads; `None` uses rayon's default (one per CPU).
    pub workers: Option<usize>,
    /// Stop on the first FAIL, ERROR or diagnostic.
    pub fail_fast: bool,
    /// Report targets that were not exercised as SKIP test cases.
    pub report_skipped: bool,
}

/// Runs a [`FuzzerRegistry`] against the operations of a contract.
pub struct FuzzRunner<'a> {
    registry: &'a FuzzerRegistry,
    caller: &'a dyn ServiceCaller,
    config: RunConfig,
}

impl<'a> FuzzRunner<'a> {
    pub fn new(registry: &'a FuzzerRegistry, caller: &'a dyn ServiceCaller) -> Self {
        Self {
            registry,
            caller,
            config: RunConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Fuzz every entry, reporting test cases through `reporter`.
    ///
    /// Only pool construction can fail; malformed operations are recorded in
    /// the summary and the rest of the run continues.
    pub fn run(
        &self,
        entries: &[ContractEntry],
        reporter: &dyn TestCaseReporter,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.config.workers {
            builder = builder.num_threads(workers.max(1));
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow!("Failed to build worker pool: {}", e))?;

        let tally = Tally::new(reporter);
        let start = Instant::now();
        info!(
            operations = entries.len(),
            fuzzers = self.registry.len(),
            workers = pool.current_num_threads(),
            "Starting fuzz run"
        );

        let aborted: Vec<AbortedOperation> = pool.install(|| {
            entries
                .par_iter()
                .enumerate()
                .filter_map(|(index, entry)| self.run_entry(index, entry, &tally, cancel))
                .collect()
        });

        let (verdicts, diagnostics) = tally.into_counts();
        let summary = RunSummary {
            operations: entries.len(),
            verdicts,
            diagnostics,
            aborted,
            cancelled: cancel.is_cancelled(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            passed = summary.verdicts.passed,
            failed = summary.verdicts.failed,
            errored = summary.verdicts.errored,
            skipped = summary.verdicts.skipped,
            aborted = summary.aborted.len(),
            elapsed_ms = summary.elapsed_ms,
            "Fuzz run finished"
        );
        Ok(summary)
    }

    fn run_entry(
        &self,
        index: usize,
        entry: &ContractEntry,
        reporter: &dyn TestCaseReporter,
        cancel: &CancellationToken,
    ) -> Option<AbortedOperation> {
        if cancel.is_cancelled() {
            return None;
        }

        let checked = match entry {
            ContractEntry::Ready(operation) => operation
                .validate()
                .map(|()| operation)
                .map_err(FuzzError::from),
            ContractEntry::Malformed(violation) => Err(FuzzError::from(violation.clone())),
        };
        let operation = match checked {
            Ok(operation) => operation,
            Err(e) => {
                warn!(index, "Aborting operation: {}", e);
                return Some(AbortedOperation {
                    index,
                    operation: entry.operation_id(),
                    reason: e.to_string(),
                });
            }
        };

        self.run_operation(index, operation, reporter, cancel);
        None
    }

    fn run_operation(
        &self,
        index: usize,
        operation: &OperationView,
        reporter: &dyn TestCaseReporter,
        cancel: &CancellationToken,
    ) {
        let executor = Executor::new(self.caller, reporter, cancel).with_config(ExecutorConfig {
            report_skipped: self.config.report_skipped,
            fail_fast: self.config.fail_fast,
        });
        let mut sequence = TestSequence::new(index);

        info!(operation = %operation.id(), "Fuzzing operation");
        for fuzzer in self.registry.iter() {
            if cancel.is_cancelled() {
                break;
            }
            match fuzzer {
                Fuzzer::Field(f) => executor.run_field_fuzzer(operation, f.as_ref(), &mut sequence),
                Fuzzer::Header(f) => {
                    executor.run_header_fuzzer(operation, f.as_ref(), &mut sequence)
                }
                Fuzzer::Operation(f) => {
                    executor.run_operation_fuzzer(operation, f.as_ref(), &mut sequence)
                }
            }
        }
        info!(
            operation = %operation.id(),
            test_cases = sequence.issued(),
            "Finished operation"
        );
    }
}

/// Forwards to the run's reporter while counting verdicts and diagnostics.
struct Tally<'a> {
    inner: &'a dyn TestCaseReporter,
    counts: Mutex<(VerdictCounts, usize)>,
}

impl<'a> Tally<'a> {
    fn new(inner: &'a dyn TestCaseReporter) -> Self {
        Self {
            inner,
            counts: Mutex::new((VerdictCounts::default(), 0)),
        }
    }

    fn into_counts(self) -> (VerdictCounts, usize) {
        self.counts.into_inner()
    }
}

impl TestCaseReporter for Tally<'_> {
    fn report_result(&self, operation: &OperationView, case: TestCase) {
        self.counts.lock().0.record(&case.verdict);
        self.inner.report_result(operation, case);
    }

    fn report_error(&self, context: &TestContext, template: &str, args: &[String]) {
        self.counts.lock().1 += 1;
        self.inner.report_error(context, template, args);
    }

    fn is_field_not_a_discriminator(&self, path: &str) -> bool {
        self.inner.is_field_not_a_discriminator(path)
    }
}

