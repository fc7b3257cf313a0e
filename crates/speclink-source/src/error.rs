use std::path::PathBuf;

/// Errors that can occur while fetching document bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The location does not name a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// The document exceeds the configured size limit.
    #[error("document too large ({size} bytes, max {max}): {location}")]
    TooLarge {
        location: String,
        size: u64,
        max: usize,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {location}")]
    Status { location: String, status: u16 },

    /// The request never produced a response.
    #[error("transport failure fetching {location}: {message}")]
    Transport { location: String, message: String },

    /// No fetcher handles this URI scheme.
    #[error("unsupported URI scheme {scheme:?} in {location}")]
    UnsupportedScheme { scheme: String, location: String },

    /// A `file:` URL that does not map onto a local path.
    #[error("invalid file location: {0}")]
    InvalidFileLocation(String),

    /// Nothing is registered for the location (in-memory fetcher).
    #[error("no document registered for {0}")]
    NotFound(String),
}

impl FetchError {
    /// HTTP status code, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that can occur while decoding bytes into a node tree, or encoding back.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is not valid YAML, or not representable as a JSON tree.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Input is not UTF-8 text.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
