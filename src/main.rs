//! Process scheduler simulator CLI
//!
//! Runs a coordinator that launches a bounded population of simulated
//! processes into a fixed-capacity table, polls them round-robin over a
//! request/reply channel, and reaps each one when its randomly drawn
//! lifetime runs out on the simulated clock.
//!
//! # Output Format
//!
//! One line per event is written to stdout (or to the `-f` log file):
//! worker launches, terminations, reaps, periodic table reports, and the
//! final run summary.
//!
//! # Exit Codes
//!
//! - `0`: the simulation ran to completion (a clean signal shutdown counts)
//! - `1`: runtime failure (worker failure, protocol violation, I/O)
//! - `2`: invalid arguments

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use schedsim::{Coordinator, LogWriter, ReportSink, SimConfig};

fn print_usage(exe: &OsStr) {
    eprintln!(
        "usage: {} [OPTIONS]

OPTIONS:
    -n <count>      Total workers to launch over the run (default: 5)
    -s <count>      Maximum workers running at once (default: 3)
    -t <seconds>    Upper bound on random worker lifetimes (default: 4.5)
    -i <seconds>    Simulated interval between launches (default: 0.2)
    -f <path>       Write the run log to <path> instead of stdout
    -h              Show this help message",
        exe.to_string_lossy()
    );
}

/// What the command line asked for.
#[derive(Debug)]
enum Command {
    /// Run the simulation with this configuration and log destination.
    Run(SimConfig, Option<PathBuf>),
    /// Print usage and exit cleanly.
    Help,
}

/// Parses the flags into a [`Command`], defaults filled in.
///
/// `args` starts after the executable name. The first problem wins; the
/// caller turns the error into usage text and exit code 2.
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<Command, String> {
    let mut cfg = SimConfig::default();
    let mut log_path = None;

    while let Some(arg) = args.next() {
        let Some(flag) = arg.to_str() else {
            return Err(format!(
                "unrecognized argument: {}",
                arg.to_string_lossy()
            ));
        };
        match flag {
            "-n" => cfg.target_workers = parse_flag(flag, &mut args, parse_count)?,
            "-s" => cfg.max_concurrent = parse_flag(flag, &mut args, parse_count)?,
            "-t" => cfg.worker_time_limit = parse_flag(flag, &mut args, parse_seconds)?,
            "-i" => cfg.launch_interval = parse_flag(flag, &mut args, parse_seconds)?,
            "-f" => {
                // Raw OsString so non-UTF-8 paths survive.
                let Some(value) = args.next() else {
                    return Err("-f requires a value".to_string());
                };
                log_path = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(format!("unknown flag: {flag}")),
        }
    }
    Ok(Command::Run(cfg, log_path))
}

/// Takes the next token as the value of `flag` and parses it.
fn parse_flag<T>(
    flag: &str,
    args: &mut impl Iterator<Item = OsString>,
    parse: fn(&str) -> Result<T, String>,
) -> Result<T, String> {
    let value = args
        .next()
        .and_then(|v| v.to_str().map(str::to_owned))
        .ok_or_else(|| format!("{flag} requires a value"))?;
    parse(&value).map_err(|err| format!("invalid {flag} value: {err}"))
}

fn parse_count(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| format!("expected a non-negative integer, got '{value}'"))
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("expected a number of seconds, got '{value}'"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!(
            "expected a non-negative number of seconds, got '{value}'"
        ));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("seconds value out of range: '{value}'"))
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "schedsim".into());

    let (cfg, log_path) = match parse_args(args) {
        Ok(Command::Run(cfg, log_path)) => (cfg, log_path),
        Ok(Command::Help) => {
            print_usage(&exe);
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage(&exe);
            process::exit(2);
        }
    };

    if let Err(err) = cfg.validate() {
        eprintln!("{err}");
        print_usage(&exe);
        process::exit(2);
    }

    let sink: Arc<dyn ReportSink> = match &log_path {
        Some(path) => Arc::new(
            LogWriter::file(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?,
        ),
        None => Arc::new(LogWriter::stdout()),
    };

    let coordinator = Coordinator::new(cfg, vec![sink]).await?;
    coordinator.run(CancellationToken::new()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Command, String> {
        parse_args(tokens.iter().copied().map(OsString::from))
    }

    #[test]
    fn test_parse_count_accepts_integers_only() {
        assert_eq!(parse_count("12").unwrap(), 12);
        assert_eq!(parse_count("0").unwrap(), 0);
        assert!(parse_count("-3").is_err());
        assert!(parse_count("four").is_err());
    }

    #[test]
    fn test_parse_seconds_accepts_fractions() {
        assert_eq!(parse_seconds("4.5").unwrap(), Duration::from_millis(4_500));
        assert_eq!(parse_seconds("0.2").unwrap(), Duration::from_millis(200));
        assert_eq!(parse_seconds("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_parse_seconds_rejects_junk() {
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("NaN").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("1e20").is_err(), "finite but too big for a Duration");
        assert!(parse_seconds("fast").is_err());
    }

    #[test]
    fn test_parse_args_defaults_match_config_defaults() {
        let Ok(Command::Run(cfg, log_path)) = parse(&[]) else {
            panic!("no flags must parse");
        };
        let defaults = SimConfig::default();
        assert_eq!(cfg.target_workers, defaults.target_workers);
        assert_eq!(cfg.max_concurrent, defaults.max_concurrent);
        assert_eq!(cfg.worker_time_limit, defaults.worker_time_limit);
        assert_eq!(cfg.launch_interval, defaults.launch_interval);
        assert_eq!(log_path, None);
    }

    #[test]
    fn test_parse_args_reads_every_flag() {
        let Ok(Command::Run(cfg, log_path)) =
            parse(&["-n", "7", "-s", "2", "-t", "1.5", "-i", "0.5", "-f", "run.log"])
        else {
            panic!("valid flags must parse");
        };
        assert_eq!(cfg.target_workers, 7);
        assert_eq!(cfg.max_concurrent, 2);
        assert_eq!(cfg.worker_time_limit, Duration::from_millis(1_500));
        assert_eq!(cfg.launch_interval, Duration::from_millis(500));
        assert_eq!(log_path, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_parse_args_help_short_and_long() {
        assert!(matches!(parse(&["-h"]), Ok(Command::Help)));
        assert!(matches!(parse(&["--help"]), Ok(Command::Help)));
        // Help ends parsing; tokens after it are never inspected.
        assert!(matches!(
            parse(&["-n", "3", "-h", "-bogus"]),
            Ok(Command::Help)
        ));
    }

    #[test]
    fn test_parse_args_rejects_unknown_and_missing() {
        let err = parse(&["-x"]).err().expect("unknown flag");
        assert!(err.contains("unknown flag"), "got: {err}");
        let err = parse(&["-n"]).err().expect("missing value");
        assert!(err.contains("requires a value"), "got: {err}");
    }

    #[test]
    fn test_parse_args_reports_invalid_numerics() {
        let err = parse(&["-t", "fast"]).err().expect("bad seconds");
        assert!(err.contains("invalid -t value"), "got: {err}");
        let err = parse(&["-n", "-3"]).err().expect("bad count");
        assert!(err.contains("invalid -n value"), "got: {err}");
        let err = parse(&["-i", "1e20"]).err().expect("out-of-range seconds");
        assert!(err.contains("out of range"), "got: {err}");
    }
}
