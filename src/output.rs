//! Console summary and JSON report of a finished run.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apifuzz_core::{Diagnostic, RunSummary, TestCase, VerdictCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Failures listed in the console summary before the rest are elided.
const MAX_LISTED_FAILURES: usize = 10;

/// Everything a run produced, as written by `--output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub server: String,
    pub contract: PathBuf,
    pub summary: RunSummary,
    pub per_fuzzer: BTreeMap<String, VerdictCounts>,
    /// Sorted by test case id.
    pub test_cases: Vec<TestCase>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        server: impl Into<String>,
        contract: impl Into<PathBuf>,
        summary: RunSummary,
        test_cases: Vec<TestCase>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            server: server.into(),
            contract: contract.into(),
            per_fuzzer: per_fuzzer(&test_cases),
            summary,
            test_cases,
            diagnostics,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Human-readable summary: per-fuzzer counts, then the first failures.
    pub fn print_summary(&self, out: &mut impl Write) -> io::Result<()> {
        let s = &self.summary;
        writeln!(out, "Run {} against {}", self.run_id, self.server)?;
        writeln!(
            out,
            "{} operations, {} test cases in {} ms",
            s.operations,
            s.verdicts.total(),
            s.elapsed_ms
        )?;
        writeln!(out)?;

        writeln!(
            out,
            "{:<46} {:>6} {:>6} {:>6} {:>6}",
            "FUZZER", "PASS", "FAIL", "ERROR", "SKIP"
        )?;
        for (name, counts) in &self.per_fuzzer {
            writeln!(
                out,
                "{:<46} {:>6} {:>6} {:>6} {:>6}",
                name, counts.passed, counts.failed, counts.errored, counts.skipped
            )?;
        }
        writeln!(out)?;

        let failures: Vec<&TestCase> = self
            .test_cases
            .iter()
            .filter(|c| c.verdict.is_failure())
            .collect();
        for case in failures.iter().take(MAX_LISTED_FAILURES) {
            writeln!(
                out,
                "{} {} [{}] {} {}: {}",
                case.verdict.label(),
                case.context.id,
                case.context.fuzzer,
                case.context.operation,
                case.context.target,
                case.verdict.message().unwrap_or_default()
            )?;
        }
        if failures.len() > MAX_LISTED_FAILURES {
            writeln!(out, "... and {} more", failures.len() - MAX_LISTED_FAILURES)?;
        }
        for diagnostic in &self.diagnostics {
            writeln!(
                out,
                "DIAGNOSTIC {} [{}] {}: {}",
                diagnostic.context.id,
                diagnostic.context.fuzzer,
                diagnostic.context.operation,
                diagnostic.message
            )?;
        }
        for aborted in &s.aborted {
            writeln!(out, "ABORTED {}: {}", aborted.operation, aborted.reason)?;
        }
        if s.cancelled {
            writeln!(out, "Run was cancelled before completion")?;
        }

        writeln!(
            out,
            "passed={} failed={} errored={} skipped={} diagnostics={} aborted={}",
            s.verdicts.passed,
            s.verdicts.failed,
            s.verdicts.errored,
            s.verdicts.skipped,
            s.diagnostics,
            s.aborted.len()
        )
    }
}

fn per_fuzzer(cases: &[TestCase]) -> BTreeMap<String, VerdictCounts> {
    let mut counts: BTreeMap<String, VerdictCounts> = BTreeMap::new();
    for case in cases {
        counts
            .entry(case.context.fuzzer.clone())
            .or_default()
            .record(&case.verdict);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use apifuzz_core::{TestCaseId, TestContext, TestTarget, Verdict};
    use apifuzz_types::{FuzzingStrategy, ResponseCodeFamily};

    fn case(fuzzer: &str, sequence: u32, verdict: Verdict) -> TestCase {
        TestCase {
            context: TestContext {
                id: TestCaseId {
                    operation: 0,
                    sequence,
                },
                operation: "POST /pets".to_string(),
                fuzzer: fuzzer.to_string(),
                target: TestTarget::Field {
                    path: "name".to_string(),
                },
                expected: ResponseCodeFamily::FourXx,
            },
            strategy: FuzzingStrategy::noop(),
            request: None,
            response: None,
            verdict,
        }
    }

    fn report() -> RunReport {
        let cases = vec![
            case("RemoveRequiredFieldsFuzzer", 1, Verdict::Pass),
            case(
                "RemoveRequiredFieldsFuzzer",
                2,
                Verdict::Fail {
                    message: "Call returned unexpected HTTP status code 200; expected 4XX".into(),
                },
            ),
            case("OverflowArraySizeFieldsFuzzer", 3, Verdict::Pass),
        ];
        let mut summary = RunSummary {
            operations: 1,
            ..Default::default()
        };
        for c in &cases {
            summary.verdicts.record(&c.verdict);
        }
        RunReport::new(Utc::now(), "http://localhost:8080", "api.json", summary, cases, Vec::new())
    }

    #[test]
    fn test_per_fuzzer_counts() {
        let report = report();
        let remove = &report.per_fuzzer["RemoveRequiredFieldsFuzzer"];
        assert_eq!(remove.passed, 1);
        assert_eq!(remove.failed, 1);
        assert_eq!(report.per_fuzzer["OverflowArraySizeFieldsFuzzer"].passed, 1);
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut out = Vec::new();
        report().print_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("RemoveRequiredFieldsFuzzer"));
        assert!(text.contains("FAIL Test 0.2 [RemoveRequiredFieldsFuzzer] POST /pets field name"));
        assert!(text.contains("passed=2 failed=1 errored=0"));
    }

    #[test]
    fn test_write_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.json");
        let report = report();
        report.write_json(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["run_id"], report.run_id.to_string());
        assert_eq!(written["summary"]["failed"], 1);
        assert_eq!(written["test_cases"].as_array().unwrap().len(), 3);
        assert_eq!(written["test_cases"][1]["verdict"], "FAIL");
    }
}
