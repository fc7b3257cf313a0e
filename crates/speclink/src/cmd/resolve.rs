use serde::Serialize;

use crate::cmd::{load, ResolveArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ResolveOutput {
    schema_id: &'static str,
    location: String,
    format: &'static str,
    references: usize,
    bound: usize,
    resolved: bool,
    external_documents: Vec<String>,
}

pub fn run(args: ResolveArgs, format: OutputFormat) -> CliResult<i32> {
    let loaded = load(&args.load)?;
    let out = ResolveOutput {
        schema_id: "https://schemas.3leaps.dev/speclink/cli/v1/resolve-result.schema.json",
        location: loaded.location.to_string(),
        format: loaded.format.name(),
        references: loaded.report.references,
        bound: loaded.report.bound,
        resolved: loaded.document.is_resolved(),
        external_documents: loaded
            .report
            .external_documents
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut rows = vec![
                vec!["location".to_string(), out.location.clone()],
                vec!["format".to_string(), out.format.to_string()],
                vec!["references".to_string(), out.references.to_string()],
                vec!["bound".to_string(), out.bound.to_string()],
                vec!["resolved".to_string(), out.resolved.to_string()],
            ];
            for document in &out.external_documents {
                rows.push(vec!["external".to_string(), document.clone()]);
            }
            print_table(&["FIELD", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            println!(
                "{} ({}): {} references, {} bound",
                out.location, out.format, out.references, out.bound
            );
            for document in &out.external_documents {
                println!("  loaded {document}");
            }
        }
    }
    Ok(SUCCESS)
}
