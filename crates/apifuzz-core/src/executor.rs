//! Field/header iteration executor.
//!
//! Drives one policy over one operation: enumerates targets, asks the policy
//! for strategies, applies each to a fresh copy of the request, dispatches it
//! and reports exactly one [`TestCase`] per dispatched strategy. Everything
//! within an operation runs sequentially and in generation order.

use apifuzz_types::{
    FuzzingStrategy, Header, HttpMethod, OperationView, ServiceCaller, ServiceRequest,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::cancel::CancellationToken;
use crate::catalog::{FieldFuzzer, HeaderFuzzer, OperationFuzzer};
use crate::classifier::{classify, Verdict};
use crate::mutation::{apply_to_headers, apply_to_payload, current_value};
use crate::report::{TestCase, TestCaseReporter, TestContext, TestSequence, TestTarget};

/// Execution switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorConfig {
    /// Emit a SKIP test case for every target that is not exercised.
    pub report_skipped: bool,
    /// Cancel the run on the first FAIL or ERROR verdict.
    pub fail_fast: bool,
}

pub struct Executor<'a> {
    caller: &'a dyn ServiceCaller,
    reporter: &'a dyn TestCaseReporter,
    cancel: &'a CancellationToken,
    config: ExecutorConfig,
}

impl<'a> Executor<'a> {
    pub fn new(
        caller: &'a dyn ServiceCaller,
        reporter: &'a dyn TestCaseReporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            caller,
            reporter,
            cancel,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a field policy over every field of `operation`.
    pub fn run_field_fuzzer(
        &self,
        operation: &OperationView,
        fuzzer: &dyn FieldFuzzer,
        sequence: &mut TestSequence,
    ) {
        if excluded(operation.method(), fuzzer.skip_for_methods()) {
            debug!(
                fuzzer = fuzzer.name(),
                operation = %operation.id(),
                "method excluded, skipping operation"
            );
            return;
        }

        for (path, field) in operation.fields() {
            if self.cancel.is_cancelled() {
                return;
            }

            let context = |sequence: &mut TestSequence| TestContext {
                id: sequence.next_id(),
                operation: operation.id(),
                fuzzer: fuzzer.name().to_string(),
                target: TestTarget::Field { path: path.clone() },
                expected: fuzzer.expected_outcome(),
            };

            if !fuzzer.is_applicable(field) {
                self.skip(operation, sequence, context, "field type not applicable");
                continue;
            }
            if fuzzer.requires_non_discriminator()
                && (field.discriminator || !self.reporter.is_field_not_a_discriminator(path))
            {
                self.skip(operation, sequence, context, "field is a discriminator");
                continue;
            }
            let Some(current) = current_value(operation.payload(), path) else {
                self.skip(operation, sequence, context, "field not present in payload");
                continue;
            };

            let strategies = match fuzzer.generate(path, field, current) {
                Ok(strategies) => strategies,
                Err(e) => {
                    warn!(fuzzer = fuzzer.name(), operation = %operation.id(), "{}", e);
                    self.skip(operation, sequence, context, "strategy generation failed");
                    continue;
                }
            };
            if strategies.is_empty() {
                self.skip(operation, sequence, context, "no strategies for field");
                continue;
            }

            for strategy in strategies {
                if self.cancel.is_cancelled() {
                    return;
                }
                let payload = match apply_to_payload(operation.payload(), path, &strategy) {
                    Ok(payload) => payload,
                    Err(e) => {
                        debug!(fuzzer = fuzzer.name(), "{}", e);
                        continue;
                    }
                };
                let request = build_request(operation, &payload, operation.headers().to_vec());
                self.dispatch(
                    operation,
                    context(sequence),
                    strategy,
                    request,
                    fuzzer.validates_response_schema(),
                );
            }
        }
    }

    /// Run a header policy over every declared header of `operation`.
    pub fn run_header_fuzzer(
        &self,
        operation: &OperationView,
        fuzzer: &dyn HeaderFuzzer,
        sequence: &mut TestSequence,
    ) {
        if excluded(operation.method(), fuzzer.skip_for_methods()) {
            debug!(
                fuzzer = fuzzer.name(),
                operation = %operation.id(),
                "method excluded, skipping operation"
            );
            return;
        }

        for header in operation.headers() {
            if self.cancel.is_cancelled() {
                return;
            }

            let context = |sequence: &mut TestSequence| TestContext {
                id: sequence.next_id(),
                operation: operation.id(),
                fuzzer: fuzzer.name().to_string(),
                target: TestTarget::Header {
                    name: header.name.clone(),
                },
                expected: fuzzer.expected_outcome(header),
            };

            if !fuzzer.is_applicable(header) {
                self.skip(operation, sequence, context, "header not applicable");
                continue;
            }
            let strategies = fuzzer.generate(header);
            if strategies.is_empty() {
                self.skip(operation, sequence, context, "no strategies for header");
                continue;
            }

            for strategy in strategies {
                if self.cancel.is_cancelled() {
                    return;
                }
                let headers = match apply_to_headers(operation.headers(), &header.name, &strategy) {
                    Ok(headers) => headers,
                    Err(e) => {
                        debug!(fuzzer = fuzzer.name(), "{}", e);
                        continue;
                    }
                };
                let request = build_request(operation, operation.payload(), headers);
                self.dispatch(
                    operation,
                    context(sequence),
                    strategy,
                    request,
                    fuzzer.validates_response_schema(header),
                );
            }
        }
    }

    /// Send `operation` unmodified, report the baseline result and any
    /// findings the policy raises about the response.
    pub fn run_operation_fuzzer(
        &self,
        operation: &OperationView,
        fuzzer: &dyn OperationFuzzer,
        sequence: &mut TestSequence,
    ) {
        if excluded(operation.method(), fuzzer.skip_for_methods()) {
            debug!(
                fuzzer = fuzzer.name(),
                operation = %operation.id(),
                "method excluded, skipping operation"
            );
            return;
        }
        if self.cancel.is_cancelled() {
            return;
        }

        let context = TestContext {
            id: sequence.next_id(),
            operation: operation.id(),
            fuzzer: fuzzer.name().to_string(),
            target: TestTarget::Operation,
            expected: fuzzer.expected_outcome(),
        };
        let request = build_request(operation, operation.payload(), operation.headers().to_vec());
        let case = self.dispatch_case(operation, context, FuzzingStrategy::noop(), request, false);

        if let Some(response) = &case.response {
            for finding in fuzzer.inspect(response) {
                self.reporter
                    .report_error(&case.context, finding.template, &finding.args);
                if self.config.fail_fast {
                    self.cancel.cancel();
                }
            }
        }
        self.reporter.report_result(operation, case);
    }

    fn dispatch(
        &self,
        operation: &OperationView,
        context: TestContext,
        strategy: FuzzingStrategy,
        request: ServiceRequest,
        validate_schema: bool,
    ) {
        let case = self.dispatch_case(operation, context, strategy, request, validate_schema);
        self.reporter.report_result(operation, case);
    }

    fn dispatch_case(
        &self,
        operation: &OperationView,
        context: TestContext,
        strategy: FuzzingStrategy,
        request: ServiceRequest,
        validate_schema: bool,
    ) -> TestCase {
        trace!(
            id = %context.id,
            fuzzer = %context.fuzzer,
            target = %context.target,
            strategy = %strategy,
            "dispatching"
        );

        let outcome = self.caller.call(&request);
        let verdict = classify(
            context.expected,
            outcome.as_ref(),
            operation.response_schema(),
            validate_schema,
        );

        if verdict.is_failure() {
            debug!(
                id = %context.id,
                verdict = verdict.label(),
                message = ?verdict.message(),
                "test case failed"
            );
            if self.config.fail_fast {
                self.cancel.cancel();
            }
        }

        TestCase {
            context,
            strategy,
            request: Some(request),
            response: outcome.ok(),
            verdict,
        }
    }

    fn skip<F>(
        &self,
        operation: &OperationView,
        sequence: &mut TestSequence,
        context: F,
        reason: &str,
    ) where
        F: Fn(&mut TestSequence) -> TestContext,
    {
        if !self.config.report_skipped {
            debug!(operation = %operation.id(), "skipped: {}", reason);
            return;
        }
        let context = context(sequence);
        debug!(id = %context.id, target = %context.target, "skipped: {}", reason);
        self.reporter.report_result(
            operation,
            TestCase {
                context,
                strategy: FuzzingStrategy::noop(),
                request: None,
                response: None,
                verdict: Verdict::Skip {
                    reason: reason.to_string(),
                },
            },
        );
    }
}

fn excluded(method: HttpMethod, skip_for: &[HttpMethod]) -> bool {
    skip_for.contains(&method)
}

/// Body methods carry the payload as JSON; every other method carries its
/// top-level fields as query parameters.
fn build_request(
    operation: &OperationView,
    payload: &Value,
    headers: Vec<Header>,
) -> ServiceRequest {
    let (body, query) = if operation.method().has_body() {
        let body = (!payload.is_null()).then(|| payload.to_string());
        (body, Vec::new())
    } else {
        (None, query_params(payload))
    };
    ServiceRequest {
        method: operation.method(),
        path: operation.path().to_string(),
        query,
        headers,
        body,
        content_type: operation.content_type().to_string(),
    }
}

/// Strings go as-is, arrays repeat the parameter per element, anything else
/// is sent as its JSON text. Nulls are left out.
fn query_params(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = payload else {
        return Vec::new();
    };
    let mut params = Vec::new();
    for (name, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    params.push((name.clone(), query_text(item)));
                }
            }
            other => params.push((name.clone(), query_text(other))),
        }
    }
    params
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
