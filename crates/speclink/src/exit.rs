use std::fmt;

use speclink_resolve::ResolveError;
use speclink_source::{DecodeError, FetchError};

pub const SUCCESS: i32 = 0;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const DATA_ERROR: i32 = 65;
pub const NO_INPUT: i32 = 66;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn resolve_error(context: &str, err: ResolveError) -> CliError {
    let code = if err.is_interrupted() {
        TIMEOUT
    } else if err.is_decode() {
        DATA_ERROR
    } else {
        NO_INPUT
    };
    let mut message = format!("{context}: {err}");
    let chain = err.chain();
    if !chain.is_empty() {
        message.push_str(&format!(" (via {})", chain.join(" -> ")));
    }
    CliError::new(code, message)
}

pub fn encode_error(context: &str, err: DecodeError) -> CliError {
    CliError::new(INTERNAL, format!("{context}: {err}"))
}

pub fn location_error(input: &str, err: FetchError) -> CliError {
    CliError::new(USAGE, format!("invalid location {input:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_resolution_maps_to_timeout() {
        let err = resolve_error("resolve", ResolveError::DeadlineExceeded);
        assert_eq!(err.code, TIMEOUT);
        let err = resolve_error(
            "resolve",
            ResolveError::Via {
                reference: "common.yaml#/Pet".into(),
                location: "file:///api.yaml".into(),
                source: Box::new(ResolveError::Cancelled),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.contains("via common.yaml#/Pet"));
    }

    #[test]
    fn missing_target_maps_to_no_input() {
        let err = resolve_error(
            "resolve",
            ResolveError::NotFound {
                reference: "#/components/schemas/Gone".into(),
                pointer: "/components/schemas/Gone".into(),
                document: "file:///api.yaml".into(),
            },
        );
        assert_eq!(err.code, NO_INPUT);
    }
}
