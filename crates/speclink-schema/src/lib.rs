//! Instance validation against speclink schema objects.
//!
//! [`SchemaValidator`] checks a JSON value against a resolved
//! [`speclink_model::Schema`] and reports every failed keyword with the
//! location inside the instance where it failed. Schemas must be resolved
//! first: an unbound `$ref` stops validation with
//! [`SchemaError::Unresolved`].

pub mod config;
pub mod error;
mod format;
pub mod path;
pub mod validator;

pub use config::SchemaConfig;
pub use error::{Result, SchemaError, Violation, Violations};
pub use path::InstancePath;
pub use validator::{equal, SchemaValidator};
