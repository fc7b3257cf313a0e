//! Reference resolution for speclink documents.
//!
//! The [`Resolver`] walks a decoded [`speclink_model::Document`] depth-first
//! and binds every `$ref` cell to its target:
//! - targets in the same document bind to the entity already decoded there,
//!   so references share identity with the components they name
//! - targets in other documents are fetched once per pass, decoded lazily at
//!   the addressed pointer, and resolved in turn
//! - recursive and mutually recursive references bind by identity
//!
//! The [`Loader`] strings the pieces together: bytes, untyped tree, typed
//! document, resolved document.

pub mod config;
pub mod error;
mod index;
pub mod loader;
pub mod resolver;

pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use loader::{Loaded, Loader};
pub use resolver::{ResolveReport, Resolver};
pub use tokio_util::sync::CancellationToken;
