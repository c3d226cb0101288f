mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "e2eprims",
    version,
    about = "End-to-end protection demo and fault-injection CLI"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). E2EPRIMS_LOG overrides it when set.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_airbag_subcommand() {
        let cli = Cli::try_parse_from([
            "e2eprims",
            "airbag",
            "--pattern",
            "alternate",
            "--repeat",
            "2",
            "--every",
            "3",
        ])
        .expect("airbag args should parse");

        match cli.command {
            Command::Airbag(args) => {
                assert_eq!(args.faults.repeat, Some(2));
                assert_eq!(args.faults.every, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_triggers() {
        let err = Cli::try_parse_from(["e2eprims", "airbag", "--drop", "--after", "1", "--every", "2"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_malformed_bit_flip() {
        let err = Cli::try_parse_from(["e2eprims", "airbag", "--bit-flip", "2:9"])
            .expect_err("bit out of range should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_campaign_with_global_format() {
        let cli = Cli::try_parse_from(["e2eprims", "campaign", "--runs", "6", "--format", "json"])
            .expect("campaign args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Campaign(_)));
    }
}
