use serde::Serialize;
use speclink_schema::SchemaConfig;
use speclink_validate::{validate_with, Issue, ValidateConfig};

use crate::cmd::{load, ValidateArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct IssueOutput {
    location: String,
    message: String,
}

impl From<Issue> for IssueOutput {
    fn from(issue: Issue) -> Self {
        Self {
            location: issue.location,
            message: issue.message,
        }
    }
}

#[derive(Serialize)]
struct ValidateOutput {
    schema_id: &'static str,
    location: String,
    valid: bool,
    references: usize,
    external_documents: Vec<String>,
    issues: Vec<IssueOutput>,
}

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let loaded = load(&args.load)?;
    let config = ValidateConfig {
        examples: !args.no_examples,
        defaults: !args.no_defaults,
        path_parameters: !args.no_path_parameters,
        schema: SchemaConfig {
            formats: !args.no_formats,
            ..SchemaConfig::default()
        },
    };

    let issues: Vec<IssueOutput> = match validate_with(&loaded.document, &config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.into_iter().map(IssueOutput::from).collect(),
    };
    let out = ValidateOutput {
        schema_id: "https://schemas.3leaps.dev/speclink/cli/v1/validate-result.schema.json",
        location: loaded.location.to_string(),
        valid: issues.is_empty(),
        references: loaded.report.references,
        external_documents: loaded
            .report
            .external_documents
            .iter()
            .map(ToString::to_string)
            .collect(),
        issues,
    };

    print_validation(&out, format);
    Ok(if out.valid { SUCCESS } else { DATA_INVALID })
}

fn print_validation(out: &ValidateOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            if out.valid {
                println!("{}: valid", out.location);
                return;
            }
            let rows = out
                .issues
                .iter()
                .map(|issue| vec![display_location(&issue.location), issue.message.clone()])
                .collect();
            print_table(&["LOCATION", "ISSUE"], rows);
        }
        OutputFormat::Pretty => {
            for issue in &out.issues {
                println!("{}: {}", display_location(&issue.location), issue.message);
            }
            if out.valid {
                println!("{}: valid", out.location);
            } else {
                println!("{}: {} issue(s)", out.location, out.issues.len());
            }
        }
    }
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "(document)".to_string()
    } else {
        location.to_string()
    }
}
