/// Errors in reference strings and JSON pointers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The reference string is empty.
    #[error("empty reference")]
    Empty,

    /// A non-empty pointer that does not start with `/`.
    #[error("JSON pointer must be empty or start with '/': {0:?}")]
    NotAbsolute(String),

    /// A `~` that is not followed by `0` or `1`.
    #[error("invalid escape in JSON pointer token {0:?}")]
    InvalidEscape(String),

    /// A `%` that is not followed by two hex digits, or decodes to invalid UTF-8.
    #[error("invalid percent-encoding in reference fragment {0:?}")]
    InvalidPercentEncoding(String),
}

pub type Result<T> = std::result::Result<T, ReferenceError>;
