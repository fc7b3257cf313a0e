use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Library crates whose events follow `--log-level`.
const CRATES: [&str; 6] = [
    "speclink",
    "speclink_source",
    "speclink_model",
    "speclink_resolve",
    "speclink_schema",
    "speclink_validate",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives for `level`: the speclink crates log at `level`,
/// dependencies such as the HTTP client stay at `warn` or quieter.
pub fn filter_directives(level: LogLevel) -> String {
    let baseline = match level {
        LogLevel::Error => "error",
        _ => "warn",
    };
    let mut directives = vec![baseline.to_string()];
    directives.extend(
        CRATES
            .iter()
            .map(|name| format!("{name}={}", level.as_str())),
    );
    directives.join(",")
}

/// Install the stderr subscriber. Stdout stays reserved for command output.
///
/// A valid `RUST_LOG` replaces the directives built from `level`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
