//! Round-trip harness for `blobio_core`.
//!
//! Writes a seeded stream of primitives through a bit buffer, then runs a
//! host/client string table session over detached byte arrays. The process
//! exits non-zero if anything read back differs from what was written.

mod config;
mod logging;
mod report;
mod roundtrip;
mod sample_gen;

use std::process::ExitCode;

use config::Config;
use report::Report;
use roundtrip::Mismatch;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    logging::setup_logging(&config.log_directives, !config.json_logs);

    if config.print_config {
        config.print();
    }

    let mut report = Report::new();
    let span = tracing::info_span!("round_trip", seed = config.seed);
    let failures = span.in_scope(|| run(&config, &mut report));
    report.complete();

    if config.print_report {
        report.print_summary();
    }
    report.print_result();

    if failures.is_empty() && report.passed() {
        ExitCode::SUCCESS
    } else {
        eprintln!("replay with --seed {}", config.seed);
        ExitCode::FAILURE
    }
}

fn run(config: &Config, report: &mut Report) -> Vec<(&'static str, Mismatch)> {
    let mut failures = Vec::new();

    let samples = sample_gen::generate_samples(config.seed, config.values);
    tracing::info!(samples = samples.len(), "starting primitive round trip");
    if let Some(mismatch) = roundtrip::run_primitive_round_trip(&samples, report) {
        failures.push(("primitives", mismatch));
    }

    let vocabulary = sample_gen::generate_vocabulary(config.seed, config.vocab);
    let messages =
        sample_gen::generate_messages(config.seed.wrapping_add(1), &vocabulary, config.messages);
    tracing::info!(
        vocabulary = vocabulary.len(),
        messages = messages.len(),
        "starting string table session"
    );
    if let Some(mismatch) = roundtrip::run_string_session(&messages, report) {
        failures.push(("string table", mismatch));
    }

    for (phase, mismatch) in &failures {
        tracing::error!(
            phase,
            index = mismatch.index,
            position = mismatch.position,
            expected = %mismatch.expected,
            actual = %mismatch.actual,
            "round trip mismatch"
        );
    }
    failures
}
