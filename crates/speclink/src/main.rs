mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "speclink", version, about = "Load, resolve and validate OpenAPI documents")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "SPECLINK_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "SPECLINK_LOG_LEVEL",
        global = true
    )]
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
    fn parses_validate_subcommand() {
        let cli = Cli::try_parse_from([
            "speclink",
            "validate",
            "openapi.yaml",
            "--external-refs",
            "--no-examples",
            "--timeout",
            "30s",
        ])
        .expect("validate args should parse");

        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.load.external_refs);
        assert!(args.no_examples);
        assert_eq!(args.load.timeout.as_deref(), Some("30s"));
    }

    #[test]
    fn convert_requires_target_encoding() {
        let err = Cli::try_parse_from(["speclink", "convert", "openapi.yaml"])
            .expect_err("missing --to should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["speclink", "convert", "openapi.json", "--to", "yaml"])
            .expect("convert args should parse");
        assert!(matches!(cli.command, Command::Convert(_)));
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["speclink", "resolve", "api.json", "--format", "json"])
            .expect("global flag should parse after subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
