//! apifuzz
//!
//! Negative testing for HTTP APIs driven by a normalized contract:
//!
//! - **Contract loading**: [`contract::JsonContractSource`] reads operations,
//!   field descriptors, headers and response schemas from JSON
//! - **Fuzzing**: the [`apifuzz_core`] engine mutates one field or header at a
//!   time and classifies every response
//! - **Transport**: [`apifuzz_transport`] sends requests with `ureq`
//! - **Reporting**: [`output`] prints a console summary and writes a JSON report
//!
//! See [`run`] for the end-to-end flow used by the CLI.

pub mod args;
pub mod contract;
pub mod output;

use std::io;

use anyhow::{Context, Result};
use apifuzz_core::{
    CancellationToken, CollectingReporter, ContractSource, FuzzRunner, FuzzerRegistry, RunSummary,
};
use apifuzz_transport::HttpServiceCaller;
use chrono::Utc;
use tracing::info;

use crate::args::Settings;
use crate::contract::JsonContractSource;
use crate::output::RunReport;

/// Load the contract, fuzz every operation and emit the report.
pub fn run(settings: &Settings, cancel: &CancellationToken) -> Result<RunSummary> {
    let registry = FuzzerRegistry::from_selection(&settings.selection)
        .context("Invalid fuzzer selection")?;
    let source = JsonContractSource::from_path(&settings.contract)?;
    let entries = source.load()?;
    let reporter = CollectingReporter::new(source.discriminators()?);
    let caller = HttpServiceCaller::new(&settings.caller);

    info!(
        contract = %settings.contract.display(),
        server = caller.base_url(),
        fuzzers = ?registry.names(),
        "Fuzzing contract"
    );
    let started_at = Utc::now();
    let summary = FuzzRunner::new(&registry, &caller)
        .with_config(settings.run)
        .run(&entries, &reporter, cancel)?;

    let report = RunReport::new(
        started_at,
        caller.base_url(),
        settings.contract.clone(),
        summary.clone(),
        reporter.test_cases(),
        reporter.diagnostics(),
    );
    report
        .print_summary(&mut io::stdout().lock())
        .context("Failed to print summary")?;
    if let Some(path) = &settings.output {
        report.write_json(path)?;
        info!(path = %path.display(), "Wrote report");
    }
    Ok(summary)
}

/// `name  kind  description` for every built-in fuzzer.
pub fn list_fuzzers(out: &mut impl io::Write) -> io::Result<()> {
    for fuzzer in FuzzerRegistry::all().iter() {
        writeln!(
            out,
            "{:<46} {:<10} {}",
            fuzzer.name(),
            fuzzer.kind(),
            fuzzer.description()
        )?;
    }
    Ok(())
}
