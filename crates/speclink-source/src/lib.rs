//! Byte sources for speclink.
//!
//! Two narrow collaborators live here:
//! - [`format`] turns bytes into an untyped node tree (`serde_json::Value`)
//!   and encodes documents back, in JSON or YAML
//! - [`fetch`] retrieves the bytes behind an absolute location
//!
//! Nothing in this crate knows what an API description looks like.

pub mod error;
pub mod fetch;
pub mod format;
#[cfg(feature = "http")]
pub mod http;
pub mod location;

pub use error::{DecodeError, FetchError, Result};
pub use fetch::{
    DefaultFetcher, FetchConfig, Fetcher, FileFetcher, MemoryFetcher, DEFAULT_MAX_DOCUMENT_SIZE,
};
pub use format::{decode, encode, Format};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
