use std::fmt;

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location inside the instance as a JSON pointer; empty for the instance itself.
    pub path: String,
    /// The schema keyword that failed.
    pub keyword: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            self.path.as_str()
        };
        write!(f, "{path}: {} ({})", self.message, self.keyword)
    }
}

/// Every constraint an instance failed, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any violation is for `keyword`.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.0.iter().any(|violation| violation.keyword == keyword)
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Errors that can occur during instance validation.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The instance failed one or more constraints.
    #[error("instance is invalid: {0}")]
    Invalid(Violations),

    /// A reference cell was never resolved. Validation cannot continue.
    #[error("unresolved schema reference {reference:?} at {path:?}")]
    Unresolved { reference: String, path: String },

    /// A `pattern` that is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Schema applications nested deeper than the configured maximum.
    #[error("schema nesting exceeds {max_depth} at {path:?}")]
    TooDeep { path: String, max_depth: usize },
}

impl SchemaError {
    /// The constraint failures, when the error is a plain validation failure.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            SchemaError::Invalid(violations) => Some(violations),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
