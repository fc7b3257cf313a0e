use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use speclink_resolve::{CancellationToken, Loaded, Loader, ResolverConfig};
use speclink_source::Format;
use tracing::warn;

use crate::exit::{location_error, resolve_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod convert;
pub mod envinfo;
pub mod resolve;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, resolve and validate a document.
    Validate(ValidateArgs),
    /// Load and resolve a document, reporting what was bound.
    Resolve(ResolveArgs),
    /// Re-encode a document as JSON or YAML.
    Convert(ConvertArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Resolve(args) => resolve::run(args, format),
        Command::Convert(args) => convert::run(args),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Document path, or a file/http(s) URL.
    pub input: String,
    /// Follow references into other files and URLs.
    #[arg(long)]
    pub external_refs: bool,
    /// Abort resolution after this long (e.g. 30s, 500ms, 2m).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub load: LoadArgs,
    /// Skip validating examples against their schemas.
    #[arg(long)]
    pub no_examples: bool,
    /// Skip validating schema defaults.
    #[arg(long)]
    pub no_defaults: bool,
    /// Skip the path-template parameter check.
    #[arg(long)]
    pub no_path_parameters: bool,
    /// Treat `format` as an annotation only.
    #[arg(long)]
    pub no_formats: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Encoding {
    Json,
    Yaml,
}

impl From<Encoding> for Format {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Json => Format::Json,
            Encoding::Yaml => Format::Yaml,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub load: LoadArgs,
    /// Target encoding.
    #[arg(long, value_name = "ENCODING")]
    pub to: Encoding,
    /// Write to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

/// Load and resolve the input. Ctrl-C cancels resolution.
pub(crate) fn load(args: &LoadArgs) -> CliResult<Loaded> {
    let location = speclink_source::location::parse(&args.input)
        .map_err(|err| location_error(&args.input, err))?;

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let mut config = ResolverConfig::default()
        .external_refs(args.external_refs)
        .cancel(cancel);
    if let Some(timeout) = &args.timeout {
        config = config.timeout(parse_timeout(timeout)?);
    }

    Loader::new(config)
        .load_url(&location)
        .map_err(|err| resolve_error(&format!("failed to load {}", args.input), err))
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || {
        warn!("interrupt received, cancelling");
        cancel.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub(crate) fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, scale) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = input.strip_suffix('m') {
        (num, 60_000)
    } else {
        (input, 1_000)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }
    Ok(Duration::from_millis(value.saturating_mul(scale)))
}
