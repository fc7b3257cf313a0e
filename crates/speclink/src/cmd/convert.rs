use speclink_source::{encode, Format};

use crate::cmd::{load, ConvertArgs};
use crate::exit::{encode_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::print_raw;

/// Re-encode through the typed model: `$ref` cells are written back as
/// references, not inlined.
pub fn run(args: ConvertArgs) -> CliResult<i32> {
    let loaded = load(&args.load)?;
    let target = Format::from(args.to);
    let bytes = encode(&loaded.document, target)
        .map_err(|err| encode_error(&format!("failed to encode as {}", target.name()), err))?;

    match &args.output {
        Some(path) => std::fs::write(path, &bytes).map_err(|err| {
            CliError::new(INTERNAL, format!("failed to write {}: {err}", path.display()))
        })?,
        None => print_raw(&bytes),
    }
    Ok(SUCCESS)
}
