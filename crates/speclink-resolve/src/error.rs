use speclink_model::{Kind, ReferenceError};
use speclink_source::{DecodeError, FetchError};
use url::Url;

/// Errors that abort loading or resolving a document.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The `$ref` string is not a valid reference.
    #[error("malformed reference {reference:?}: {source}")]
    Malformed {
        reference: String,
        source: ReferenceError,
    },

    /// The pointer does not address anything in the target document.
    #[error("reference {reference:?} not found: nothing at {pointer:?} in {document}")]
    NotFound {
        reference: String,
        pointer: String,
        document: String,
    },

    /// The pointer addresses an entity of another kind.
    #[error("reference {reference:?} points at {pointer:?}, which is a {found}; expected a {expected}")]
    WrongKind {
        reference: String,
        pointer: String,
        expected: Kind,
        found: Kind,
    },

    /// The pointer addresses a part of the document layout that is not an
    /// entity, such as `/info` or an operation.
    #[error("reference {reference:?} points at {pointer:?}, which is the {found}; expected a {expected}")]
    NotAnEntity {
        reference: String,
        pointer: String,
        expected: Kind,
        found: &'static str,
    },

    /// The target value cannot be decoded as the expected kind.
    #[error("reference {reference:?} target {pointer:?} is not a valid {expected}: {source}")]
    InvalidTarget {
        reference: String,
        pointer: String,
        expected: Kind,
        source: serde_json::Error,
    },

    /// An external reference while external references are disabled.
    #[error("external reference {reference:?}: external references are disabled")]
    ExternalDisabled { reference: String },

    /// The locator cannot be made into an absolute location.
    #[error("reference {reference:?} has an invalid document locator: {message}")]
    InvalidLocation { reference: String, message: String },

    /// The external document could not be fetched.
    #[error("fetching {location} for {reference:?}: {source}")]
    Fetch {
        reference: String,
        location: Url,
        source: FetchError,
    },

    /// The external document could not be decoded.
    #[error("decoding {location} for {reference:?}: {source}")]
    Decode {
        reference: String,
        location: Url,
        source: DecodeError,
    },

    /// A chain of references that never reaches a value.
    #[error("reference cycle with no value: {}", chain.join(" -> "))]
    ReferenceCycle { chain: Vec<String> },

    /// The cancellation token fired.
    #[error("resolution cancelled")]
    Cancelled,

    /// The deadline passed.
    #[error("resolution deadline exceeded")]
    DeadlineExceeded,

    /// A failure inside an external document, reached through `reference`.
    #[error("via {reference:?} ({location}): {source}")]
    Via {
        reference: String,
        location: String,
        source: Box<ResolveError>,
    },

    /// The root document could not be read.
    #[error("reading {location}: {source}")]
    Read { location: String, source: FetchError },

    /// The root document bytes are not JSON or YAML.
    #[error("decoding {location}: {source}")]
    Parse { location: Url, source: DecodeError },

    /// The root document tree does not match the document model.
    #[error("{location} is not a valid document: {source}")]
    Model {
        location: Url,
        source: serde_json::Error,
    },
}

impl ResolveError {
    /// The innermost error, looking through `Via` hops.
    pub fn root_cause(&self) -> &ResolveError {
        let mut error = self;
        while let ResolveError::Via { source, .. } = error {
            error = source.as_ref();
        }
        error
    }

    /// References traversed to reach the failure, outermost first.
    pub fn chain(&self) -> Vec<&str> {
        let mut hops = Vec::new();
        let mut error = self;
        while let ResolveError::Via {
            reference, source, ..
        } = error
        {
            hops.push(reference.as_str());
            error = source.as_ref();
        }
        hops
    }

    /// Whether the pass stopped because of cancellation or its deadline.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self.root_cause(),
            ResolveError::Cancelled | ResolveError::DeadlineExceeded
        )
    }

    /// Whether the input bytes or tree were malformed.
    pub fn is_decode(&self) -> bool {
        matches!(
            self.root_cause(),
            ResolveError::Parse { .. } | ResolveError::Model { .. } | ResolveError::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
