//! Executor behaviour for each kind of policy, driven through mock
//! collaborators.

mod common;

use apifuzz_core::catalog::{
    IterateThroughEnumValuesFieldsFuzzer, OverflowArraySizeFieldsFuzzer, RemoveHeadersFuzzer,
    RemoveRequiredFieldsFuzzer, TrailingControlCharsInHeadersFuzzer,
};
use apifuzz_core::{
    CancellationToken, CheckSecurityHeadersFuzzer, Executor, ExecutorConfig, TestSequence,
    TestTarget, Verdict,
};
use apifuzz_types::{
    FieldType, Header, HttpMethod, OperationView, PrimitiveType, ResponseCodeFamily, ResponseSchema,
    TransportError,
};
use common::{MockCaller, RecordingReporter};
use serde_json::{json, Value};

fn enum_operation(method: HttpMethod) -> OperationView {
    OperationView::new("/pets", method)
        .with_payload(json!({"objectField": {"myField": "innerValue"}}))
        .with_field("objectField", FieldType::object())
        .with_field(
            "objectField#myField",
            FieldType::enumeration(["one", "two", "three"]),
        )
}

fn body_of(request: &apifuzz_types::ServiceRequest) -> Value {
    serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
}

#[test]
fn test_enum_field_yields_two_twoxx_cases() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = enum_operation(HttpMethod::Post);

    let mut sequence = TestSequence::new(0);
    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut sequence,
    );

    assert_eq!(caller.calls(), 2);
    let cases = reporter.cases();
    assert_eq!(cases.len(), 2);
    for case in &cases {
        assert_eq!(case.context.expected, ResponseCodeFamily::TwoXx);
        assert_eq!(case.verdict, Verdict::Pass);
        assert_eq!(
            case.context.target,
            TestTarget::Field {
                path: "objectField#myField".to_string()
            }
        );
    }
    assert_eq!(cases[0].context.id.sequence, 1);
    assert_eq!(cases[1].context.id.sequence, 2);

    let sent: Vec<Value> = caller
        .requests()
        .iter()
        .map(|r| body_of(r)["objectField"]["myField"].clone())
        .collect();
    assert_eq!(sent, vec![json!("two"), json!("three")]);
}

#[test]
fn test_enum_field_marked_discriminator_by_reporter_is_untouched() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new().with_discriminator("objectField#myField");
    let cancel = CancellationToken::new();

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &enum_operation(HttpMethod::Post),
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 0);
    assert!(reporter.cases().is_empty());
}

#[test]
fn test_enum_field_marked_discriminator_in_descriptor_is_untouched() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Post)
        .with_payload(json!({"petType": "dog"}))
        .with_field(
            "petType",
            FieldType::enumeration(["dog", "cat"]).discriminator(),
        );

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 0);
    assert!(reporter.cases().is_empty());
}

#[test]
fn test_array_overflow_sends_one_oversized_request() {
    let caller = MockCaller::status(400);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/orders", HttpMethod::Post)
        .with_payload(json!({"arrayField": [{"sku": "a"}, {"sku": "b"}], "note": "keep"}))
        .with_field("arrayField", FieldType::array(None, Some(20)));

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &OverflowArraySizeFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 1);
    let body = body_of(&caller.requests()[0]);
    assert!(body["arrayField"].as_array().unwrap().len() >= 21);
    assert_eq!(body["note"], json!("keep"));

    let cases = reporter.cases();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].context.expected, ResponseCodeFamily::FourXx);
    assert_eq!(cases[0].verdict, Verdict::Pass);
}

#[test]
fn test_excluded_method_has_no_interaction() {
    let caller = MockCaller::status(400);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/orders", HttpMethod::Get)
        .with_payload(json!({"arrayField": [1, 2]}))
        .with_field("arrayField", FieldType::array(None, Some(2)));
    let config = ExecutorConfig {
        report_skipped: true,
        fail_fast: false,
    };

    let mut sequence = TestSequence::new(0);
    Executor::new(&caller, &reporter, &cancel)
        .with_config(config)
        .run_field_fuzzer(&operation, &OverflowArraySizeFieldsFuzzer, &mut sequence);

    assert_eq!(caller.calls(), 0);
    assert_eq!(reporter.interactions(), 0);
    assert_eq!(sequence.issued(), 0);
}

#[test]
fn test_primitive_fields_are_ignored_by_array_and_enum_fuzzers() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Post)
        .with_payload(json!({"age": 3, "name": "rex"}))
        .with_field("age", FieldType::primitive(PrimitiveType::Integer))
        .with_field("name", FieldType::string());

    let executor = Executor::new(&caller, &reporter, &cancel);
    let mut sequence = TestSequence::new(0);
    executor.run_field_fuzzer(&operation, &OverflowArraySizeFieldsFuzzer, &mut sequence);
    executor.run_field_fuzzer(&operation, &IterateThroughEnumValuesFieldsFuzzer, &mut sequence);

    assert_eq!(caller.calls(), 0);
    assert_eq!(reporter.interactions(), 0);
}

#[test]
fn test_report_skipped_emits_skip_cases_without_dispatch() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Post)
        .with_payload(json!({"age": 3}))
        .with_field("age", FieldType::primitive(PrimitiveType::Integer));
    let config = ExecutorConfig {
        report_skipped: true,
        fail_fast: false,
    };

    Executor::new(&caller, &reporter, &cancel)
        .with_config(config)
        .run_field_fuzzer(
            &operation,
            &IterateThroughEnumValuesFieldsFuzzer,
            &mut TestSequence::new(0),
        );

    assert_eq!(caller.calls(), 0);
    let cases = reporter.cases();
    assert_eq!(cases.len(), 1);
    assert!(matches!(cases[0].verdict, Verdict::Skip { .. }));
    assert!(cases[0].request.is_none());
}

#[test]
fn test_missing_max_items_skips_field() {
    let caller = MockCaller::status(400);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/orders", HttpMethod::Post)
        .with_payload(json!({"arrayField": [1]}))
        .with_field("arrayField", FieldType::array(None, None));

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &OverflowArraySizeFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 0);
    assert!(reporter.cases().is_empty());
}

#[test]
fn test_transport_fault_is_an_error_verdict() {
    let caller = MockCaller::refusing();
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &enum_operation(HttpMethod::Put),
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    let cases = reporter.cases();
    assert_eq!(cases.len(), 2);
    for case in cases {
        assert!(matches!(case.verdict, Verdict::Error { .. }));
        assert!(case.response.is_none());
        assert!(case.request.is_some());
    }
}

#[test]
fn test_unexpected_family_fails_with_message() {
    let caller = MockCaller::status(500);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &enum_operation(HttpMethod::Post),
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    let cases = reporter.cases();
    let message = cases[0].verdict.message().unwrap();
    assert!(message.contains("500"));
    assert!(message.contains("2XX"));
}

#[test]
fn test_enum_fuzzer_checks_response_schema() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let schema: ResponseSchema = serde_json::from_value(json!({
        "type": "object",
        "properties": {"id": {"type": "integer"}},
        "required": ["id"]
    }))
    .unwrap();
    let operation = enum_operation(HttpMethod::Post).with_response_schema(schema);

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    let cases = reporter.cases();
    assert_eq!(cases.len(), 2);
    assert!(matches!(cases[0].verdict, Verdict::Fail { .. }));
    assert!(cases[0].verdict.message().unwrap().contains("'id'"));
}

#[test]
fn test_fail_fast_stops_after_first_failure() {
    let caller = MockCaller::status(500);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let config = ExecutorConfig {
        report_skipped: false,
        fail_fast: true,
    };

    Executor::new(&caller, &reporter, &cancel)
        .with_config(config)
        .run_field_fuzzer(
            &enum_operation(HttpMethod::Post),
            &IterateThroughEnumValuesFieldsFuzzer,
            &mut TestSequence::new(0),
        );

    assert_eq!(caller.calls(), 1);
    assert!(cancel.is_cancelled());
}

#[test]
fn test_cancelled_token_prevents_dispatch() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &enum_operation(HttpMethod::Post),
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 0);
    assert!(reporter.cases().is_empty());
}

#[test]
fn test_remove_required_field_drops_only_target() {
    let caller = MockCaller::status(422);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Post)
        .with_payload(json!({"name": "rex", "tag": "good"}))
        .with_field("name", FieldType::string().required())
        .with_field("tag", FieldType::string());

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &RemoveRequiredFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 1);
    assert_eq!(body_of(&caller.requests()[0]), json!({"tag": "good"}));
    assert_eq!(reporter.cases()[0].verdict, Verdict::Pass);
}

#[test]
fn test_remove_headers_only_removes_target() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Get)
        .with_header(Header::required("Authorization", "Bearer t"))
        .with_header(Header::new("X-Trace", "abc"));

    Executor::new(&caller, &reporter, &cancel).run_header_fuzzer(
        &operation,
        &RemoveHeadersFuzzer,
        &mut TestSequence::new(0),
    );

    let requests = caller.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].header("Authorization").is_none());
    assert!(requests[0].header("X-Trace").is_some());
    assert!(requests[1].header("Authorization").is_some());
    assert!(requests[1].header("X-Trace").is_none());
    assert!(requests.iter().all(|r| r.body.is_none()));

    let cases = reporter.cases();
    assert_eq!(cases[0].context.expected, ResponseCodeFamily::FourXx);
    assert!(matches!(cases[0].verdict, Verdict::Fail { .. }));
    assert_eq!(cases[1].context.expected, ResponseCodeFamily::TwoXx);
    assert_eq!(cases[1].verdict, Verdict::Pass);
}

#[test]
fn test_trailing_control_chars_mutate_header_value() {
    let caller = MockCaller::status(400);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation =
        OperationView::new("/pets", HttpMethod::Get).with_header(Header::new("X-Trace", "abc"));

    Executor::new(&caller, &reporter, &cancel).run_header_fuzzer(
        &operation,
        &TrailingControlCharsInHeadersFuzzer,
        &mut TestSequence::new(0),
    );

    let requests = caller.requests();
    assert!(!requests.is_empty());
    assert_eq!(requests[0].header("X-Trace").unwrap().value, "abc\r\n");
    assert!(reporter.cases().iter().all(|c| c.verdict.is_pass()));
}

#[test]
fn test_security_headers_reports_missing_set() {
    let caller = MockCaller::with_headers(
        200,
        vec![
            Header::new("Cache-Control", "no-store"),
            Header::new("X-Content-Type-Options", "nosniff"),
        ],
    );
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Get);

    Executor::new(&caller, &reporter, &cancel).run_operation_fuzzer(
        &operation,
        &CheckSecurityHeadersFuzzer,
        &mut TestSequence::new(0),
    );

    assert_eq!(caller.calls(), 1);
    let cases = reporter.cases();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].context.target, TestTarget::Operation);
    assert_eq!(cases[0].verdict, Verdict::Pass);

    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    let (context, template, args) = &errors[0];
    assert_eq!(context.id, cases[0].context.id);
    assert_eq!(template, "Missing recommended Security Headers: {}");
    assert_eq!(
        args,
        &vec![
            "[X-Frame-Options: DENY, X-XSS-Protection: 0, X-XSS-Protection: 1; mode=block]"
                .to_string()
        ]
    );
}

#[test]
fn test_security_headers_silent_when_all_present() {
    let caller = MockCaller::with_headers(
        200,
        vec![
            Header::new("x-xss-protection", "0"),
            Header::new("x-frame-options", "DENY"),
            Header::new("x-content-type-options", "nosniff"),
            Header::new("cache-control", "no-store"),
        ],
    );
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();

    Executor::new(&caller, &reporter, &cancel).run_operation_fuzzer(
        &OperationView::new("/pets", HttpMethod::Get),
        &CheckSecurityHeadersFuzzer,
        &mut TestSequence::new(0),
    );

    assert!(reporter.errors().is_empty());
    assert_eq!(reporter.cases().len(), 1);
}

#[test]
fn test_sequence_continues_across_fuzzers() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = enum_operation(HttpMethod::Post);

    let executor = Executor::new(&caller, &reporter, &cancel);
    let mut sequence = TestSequence::new(4);
    executor.run_field_fuzzer(&operation, &IterateThroughEnumValuesFieldsFuzzer, &mut sequence);
    executor.run_operation_fuzzer(&operation, &CheckSecurityHeadersFuzzer, &mut sequence);

    let ids: Vec<String> = reporter
        .cases()
        .iter()
        .map(|c| c.context.id.to_string())
        .collect();
    assert_eq!(ids, vec!["Test 4.1", "Test 4.2", "Test 4.3"]);
}

#[test]
fn test_enum_field_on_get_travels_in_query() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation = OperationView::new("/pets", HttpMethod::Get)
        .with_payload(json!({"status": "one", "limit": 5, "tags": ["a", "b"], "cursor": null}))
        .with_field("status", FieldType::enumeration(["one", "two", "three"]));

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &operation,
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    let requests = caller.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query_values("status"), vec!["two"]);
    assert_eq!(requests[1].query_values("status"), vec!["three"]);
    for request in &requests {
        assert!(request.body.is_none());
        assert_eq!(request.query_values("limit"), vec!["5"]);
        assert_eq!(request.query_values("tags"), vec!["a", "b"]);
        assert!(request.query_values("cursor").is_empty());
    }
    assert_eq!(reporter.cases().len(), 2);
}

#[test]
fn test_nested_enum_field_on_get_is_sent_as_json_parameter() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();

    Executor::new(&caller, &reporter, &cancel).run_field_fuzzer(
        &enum_operation(HttpMethod::Get),
        &IterateThroughEnumValuesFieldsFuzzer,
        &mut TestSequence::new(0),
    );

    let sent: Vec<Value> = caller
        .requests()
        .iter()
        .map(|r| serde_json::from_str(r.query_values("objectField")[0]).unwrap())
        .collect();
    assert_eq!(
        sent,
        vec![json!({"myField": "two"}), json!({"myField": "three"})]
    );
}

#[test]
fn test_unsendable_mutation_is_skipped_not_errored() {
    let caller = MockCaller::new(|_| {
        Err(TransportError::Unsendable {
            reason: "raw header bytes need a plain http:// server".to_string(),
        })
    });
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let operation =
        OperationView::new("/pets", HttpMethod::Get).with_header(Header::new("X-Trace", "abc"));

    Executor::new(&caller, &reporter, &cancel)
        .with_config(ExecutorConfig {
            report_skipped: false,
            fail_fast: true,
        })
        .run_header_fuzzer(
            &operation,
            &TrailingControlCharsInHeadersFuzzer,
            &mut TestSequence::new(0),
        );

    let cases = reporter.cases();
    assert!(cases.len() > 1);
    assert!(cases
        .iter()
        .all(|c| matches!(c.verdict, Verdict::Skip { .. })));
    assert!(!cancel.is_cancelled());
}

#[test]
fn test_removing_optional_header_checks_response_schema() {
    let caller = MockCaller::status(200);
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();
    let schema: ResponseSchema = serde_json::from_value(json!({
        "type": "object",
        "properties": {"id": {"type": "integer"}},
        "required": ["id"]
    }))
    .unwrap();
    let operation = OperationView::new("/pets", HttpMethod::Get)
        .with_header(Header::new("X-Trace", "abc"))
        .with_response_schema(schema);

    Executor::new(&caller, &reporter, &cancel).run_header_fuzzer(
        &operation,
        &RemoveHeadersFuzzer,
        &mut TestSequence::new(0),
    );

    let cases = reporter.cases();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].context.expected, ResponseCodeFamily::TwoXx);
    assert!(cases[0].verdict.message().unwrap().contains("'id'"));
}
