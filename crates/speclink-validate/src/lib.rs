//! Structural and example validation of resolved speclink documents.
//!
//! [`validate`] walks a resolved [`Document`] and reports every structural
//! problem it finds: missing required fields, path templates that disagree
//! with their declared parameters, server URL variables that are not
//! declared, malformed security schemes and the like. Every `example`,
//! `examples` entry and schema `default` is also run through the
//! [`speclink_schema::SchemaValidator`] against the schema in scope.
//!
//! Issues are returned as data with a dot-joined location such as
//! `paths./items.put.requestBody`, so a caller can show every problem at once.

pub mod config;
mod document;
pub mod error;
mod examples;
pub mod location;

use speclink_model::Document;

pub use config::ValidateConfig;
pub use error::{Issue, Result, ValidationErrors};
pub use location::Location;

/// Validate `document` with the default configuration.
pub fn validate(document: &Document) -> Result<()> {
    validate_with(document, &ValidateConfig::default())
}

/// Validate `document`, collecting every issue.
pub fn validate_with(document: &Document, config: &ValidateConfig) -> Result<()> {
    let mut checker = document::Checker::new(config);
    checker.document(document);
    checker.finish()
}
