//! apifuzz CLI.
//!
//! Sends mutated requests for every operation of a contract and exits
//! non-zero when any test case fails, errors, raises a diagnostic or an
//! operation had to be aborted.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use apifuzz::args::{Args, Settings};
use apifuzz_core::CancellationToken;
use clap::Parser;
use tracing::{error, warn};

fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).compact().init();
    }
}

fn install_ctrlc(cancel: &CancellationToken) {
    let cancel = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        warn!("interrupt received, finishing in-flight requests");
        cancel.cancel();
    }) {
        error!("failed to set Ctrl-C handler: {}", err);
    }
}

fn real_main(args: Args) -> Result<ExitCode> {
    if args.list_fuzzers {
        apifuzz::list_fuzzers(&mut io::stdout().lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::resolve(&args)?;
    let cancel = CancellationToken::new();
    install_ctrlc(&cancel);

    let summary = apifuzz::run(&settings, &cancel)?;
    if summary.has_failures() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.json_logs);

    match real_main(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
