//! Configuration for the blobio round-trip harness.
//!
//! Handles parsing command-line arguments and filling in defaults. Every run
//! is driven by a single seed, printed with the configuration, so any failure
//! can be replayed exactly.

/// Complete configuration for a harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // === Randomness ===
    /// Seed for every generated value
    pub seed: u64,

    // === Primitive round trip ===
    /// Number of sample groups (one value of every type per group)
    pub values: usize,

    // === String table session ===
    /// Distinct strings the host draws from
    pub vocab: usize,

    /// String frames the host sends to the client
    pub messages: usize,

    // === Logging ===
    /// `tracing` filter directives, overridden by `RUST_LOG`
    pub log_directives: String,

    /// Emit JSON log lines instead of pretty output
    pub json_logs: bool,

    // === Behavior ===
    /// Whether to print the resolved configuration
    pub print_config: bool,

    /// Whether to print the report summary
    pub print_report: bool,
}

impl Config {
    /// Parse configuration from command-line arguments (without the program name).
    ///
    /// If `--seed` is not given, a time-based seed is used.
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut seed: Option<u64> = None;
        let mut values: Option<usize> = None;
        let mut vocab: Option<usize> = None;
        let mut messages: Option<usize> = None;
        let mut log_directives: Option<String> = None;
        let mut json_logs = false;
        let mut print_config = false;
        let mut print_report = true;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    seed = Some(parse_value(args, &mut i, "--seed", "a number")?);
                }
                "--values" => {
                    values = Some(parse_value(args, &mut i, "--values", "a number")?);
                }
                "--vocab" => {
                    vocab = Some(parse_value(args, &mut i, "--vocab", "a number")?);
                }
                "--messages" => {
                    messages = Some(parse_value(args, &mut i, "--messages", "a number")?);
                }
                "--log" => {
                    log_directives = Some(parse_value(args, &mut i, "--log", "directives")?);
                }
                "--json-logs" => {
                    json_logs = true;
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-report" => {
                    print_report = false;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        let vocab = vocab.unwrap_or(16);
        if vocab == 0 {
            return Err("--vocab must be at least 1".to_string());
        }

        Ok(Config {
            seed: seed.unwrap_or_else(time_seed),
            values: values.unwrap_or(100),
            vocab,
            messages: messages.unwrap_or(200),
            log_directives: log_directives.unwrap_or_else(|| "info".to_string()),
            json_logs,
            print_config,
            print_report,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Seed: {}", self.seed);
        println!("Sample groups: {}", self.values);
        println!();
        println!("=== String Table ===");
        println!("Vocabulary: {} strings", self.vocab);
        println!("Messages: {}", self.messages);
        println!();
        println!("=== Logging ===");
        println!("Directives: {}", self.log_directives);
        println!("Format: {}", if self.json_logs { "json" } else { "pretty" });
        println!();
    }
}

/// Consume the value following flag `args[*i]` and parse it.
fn parse_value<T: std::str::FromStr>(
    args: &[String],
    i: &mut usize,
    flag: &str,
    what: &str,
) -> Result<T, String> {
    *i += 1;
    let raw = args.get(*i).ok_or_else(|| format!("{flag} requires {what}"))?;
    raw.parse().map_err(|_| format!("invalid value for {flag}: {raw}"))
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

fn print_help() {
    println!("blobio-demo: bit buffer and string table round-trip harness");
    println!();
    println!("USAGE:");
    println!("    blobio-demo [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --seed <N>          Random seed for determinism (default: time-based)");
    println!("    --values <N>        Sample groups to write and verify (default: 100)");
    println!();
    println!("    --vocab <N>         Distinct strings in the session (default: 16)");
    println!("    --messages <N>      String frames sent host to client (default: 200)");
    println!();
    println!("    --log <DIRECTIVES>  Log filter, overridden by RUST_LOG (default: info)");
    println!("    --json-logs         Emit JSON log lines");
    println!("    --print-config      Print resolved configuration");
    println!("    --no-report         Don't print the report summary");
    println!("    --help, -h          Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    blobio-demo                           # Random run");
    println!("    blobio-demo --seed 42                 # Deterministic run");
    println!("    blobio-demo --log blobio_core=trace   # Watch buffer growth and minting");
    println!();
}
