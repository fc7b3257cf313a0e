//! Load, resolve and validate OpenAPI 3.x documents.
//!
//! speclink decodes a JSON or YAML API description into a typed model,
//! binds every `$ref` to its target (same document, local files, or remote
//! documents with the `http` feature), and validates the result: structural
//! rules plus every embedded example against its schema.
//!
//! # Crate Structure
//!
//! - [`source`]: Node decoding and document fetching
//! - [`model`]: Typed document model with `$ref` cells
//! - [`resolve`]: Reference resolver and document loader
//! - [`schema`]: Instance validation against schema objects
//! - [`validate`]: Structural and example validation
//!
//! ```no_run
//! use speclink::resolve::{Loader, ResolverConfig};
//!
//! let loader = Loader::new(ResolverConfig::default().external_refs(true));
//! let loaded = loader.load_path("openapi.yaml".as_ref())?;
//! if let Err(errors) = speclink::validate::validate(&loaded.document) {
//!     for issue in &errors {
//!         eprintln!("{issue}");
//!     }
//! }
//! # Ok::<(), speclink::resolve::ResolveError>(())
//! ```

/// Re-export source types.
pub mod source {
    pub use speclink_source::*;
}

/// Re-export model types.
pub mod model {
    pub use speclink_model::*;
}

/// Re-export resolver types.
pub mod resolve {
    pub use speclink_resolve::*;
}

/// Re-export schema validation types.
pub mod schema {
    pub use speclink_schema::*;
}

/// Re-export document validation types.
pub mod validate {
    pub use speclink_validate::*;
}
