use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use apifuzz_core::{FuzzerSelection, RunConfig};
use apifuzz_transport::{HttpCallerConfig, DEFAULT_SERVER};
use apifuzz_types::env_utils::{env_list, env_string_or, env_var, env_var_or, split_list};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Normalized contract file (JSON) describing the operations to fuzz.
    #[arg(long, value_name = "PATH")]
    pub contract: Option<PathBuf>,

    /// Base URL of the service under test. Falls back to `APIFUZZ_SERVER`.
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Operations fuzzed concurrently. Falls back to `APIFUZZ_WORKERS`, then
    /// one per CPU.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-request read timeout. Falls back to `APIFUZZ_TIMEOUT_SECS`.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Connect timeout. Falls back to `APIFUZZ_CONNECT_TIMEOUT_SECS`.
    #[arg(long, value_name = "SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Only run these fuzzers (comma-separated). Falls back to `APIFUZZ_FUZZERS`.
    #[arg(long, value_name = "NAMES")]
    pub fuzzers: Option<String>,

    /// Never run these fuzzers (comma-separated). Falls back to
    /// `APIFUZZ_SKIP_FUZZERS`.
    #[arg(long, value_name = "NAMES")]
    pub skip_fuzzers: Option<String>,

    /// Stop at the first failing test case.
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Report fields and headers that were not exercised as SKIP test cases.
    #[arg(long, default_value_t = false)]
    pub report_skipped: bool,

    /// Write the full JSON report here.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the available fuzzers and exit.
    #[arg(long, default_value_t = false)]
    pub list_fuzzers: bool,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
}

/// Fully resolved settings of a fuzz run: flags first, then environment,
/// then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub contract: PathBuf,
    pub caller: HttpCallerConfig,
    pub selection: FuzzerSelection,
    pub run: RunConfig,
    pub output: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(args: &Args) -> Result<Self> {
        let Some(contract) = args.contract.clone() else {
            bail!("--contract is required unless --list-fuzzers is given");
        };

        let server = match &args.server {
            Some(server) => server.clone(),
            None => env_string_or("APIFUZZ_SERVER", DEFAULT_SERVER),
        };
        let timeout = args
            .timeout_secs
            .unwrap_or_else(|| env_var_or("APIFUZZ_TIMEOUT_SECS", 10));
        let connect_timeout = args
            .connect_timeout_secs
            .unwrap_or_else(|| env_var_or("APIFUZZ_CONNECT_TIMEOUT_SECS", 5));
        if timeout == 0 || connect_timeout == 0 {
            bail!("timeouts must be at least one second");
        }

        let workers = args.workers.or_else(|| env_var("APIFUZZ_WORKERS"));
        if workers == Some(0) {
            bail!("--workers must be at least 1");
        }

        let selection = FuzzerSelection {
            only: list_or_env(args.fuzzers.as_deref(), "APIFUZZ_FUZZERS"),
            skip: list_or_env(args.skip_fuzzers.as_deref(), "APIFUZZ_SKIP_FUZZERS"),
        };

        Ok(Self {
            contract,
            caller: HttpCallerConfig::new(server).with_timeouts(
                Duration::from_secs(timeout),
                Duration::from_secs(connect_timeout),
            ),
            selection,
            run: RunConfig {
                workers,
                fail_fast: args.fail_fast,
                report_skipped: args.report_skipped,
            },
            output: args.output.clone(),
        })
    }
}

fn list_or_env(flag: Option<&str>, key: &str) -> Vec<String> {
    match flag {
        Some(raw) => split_list(raw),
        None => env_list(key),
    }
}
