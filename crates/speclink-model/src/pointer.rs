use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::error::{ReferenceError, Result};

/// A parsed JSON pointer (RFC 6901): a sequence of unescaped tokens.
///
/// The empty pointer addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The pointer to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `/`-delimited, `~1`/`~0`-escaped pointer text.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(ReferenceError::NotAbsolute(text.to_string()));
        };
        let tokens = rest.split('/').map(unescape).collect::<Result<Vec<_>>>()?;
        Ok(Self { tokens })
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// A new pointer extended by `tokens`.
    pub fn join<S: AsRef<str>>(&self, tokens: &[S]) -> Self {
        let mut joined = self.clone();
        joined
            .tokens
            .extend(tokens.iter().map(|token| token.as_ref().to_string()));
        joined
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn starts_with(&self, other: &Pointer) -> bool {
        self.tokens.starts_with(&other.tokens)
    }

    /// Navigate an untyped tree.
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.tokens
            .iter()
            .try_fold(value, |node, token| match node {
                Value::Object(map) => map.get(token),
                Value::Array(items) => parse_index(token).and_then(|index| items.get(index)),
                _ => None,
            })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

/// Escape one token: `~` → `~0`, `/` → `~1`.
pub fn escape(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

fn unescape(token: &str) -> Result<String> {
    if !token.contains('~') {
        return Ok(token.to_string());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(ReferenceError::InvalidEscape(token.to_string())),
        }
    }
    Ok(out)
}

// Array indices are canonical decimal: no sign, no leading zeros.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_and_unescapes() {
        let pointer = Pointer::parse("/paths/~1items~1{id}/get").unwrap();
        assert_eq!(pointer.tokens(), ["paths", "/items/{id}", "get"]);

        let pointer = Pointer::parse("/a~0b/c~01").unwrap();
        assert_eq!(pointer.tokens(), ["a~b", "c~1"]);
    }

    #[test]
    fn empty_pointer_is_whole_document() {
        let doc = json!({"a": 1});
        let pointer = Pointer::parse("").unwrap();
        assert!(pointer.is_root());
        assert_eq!(pointer.lookup(&doc), Some(&doc));
    }

    #[test]
    fn rejects_relative_and_bad_escapes() {
        assert_eq!(
            Pointer::parse("components/schemas"),
            Err(ReferenceError::NotAbsolute("components/schemas".into()))
        );
        assert!(matches!(
            Pointer::parse("/a~2"),
            Err(ReferenceError::InvalidEscape(_))
        ));
        assert!(matches!(
            Pointer::parse("/a~"),
            Err(ReferenceError::InvalidEscape(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        for text in ["", "/", "/components/schemas/B", "/paths/~1pets~1{id}", "/x~0y"] {
            assert_eq!(Pointer::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn lookup_maps_escaped_slash_to_key() {
        let doc = json!({"paths": {"/pets": {"get": {"operationId": "list"}}}});
        let pointer = Pointer::parse("/paths/~1pets/get/operationId").unwrap();
        assert_eq!(pointer.lookup(&doc), Some(&json!("list")));
    }

    #[test]
    fn lookup_indexes_arrays_canonically() {
        let doc = json!({"list": ["a", "b"]});
        assert_eq!(
            Pointer::parse("/list/1").unwrap().lookup(&doc),
            Some(&json!("b"))
        );
        assert_eq!(Pointer::parse("/list/01").unwrap().lookup(&doc), None);
        assert_eq!(Pointer::parse("/list/-").unwrap().lookup(&doc), None);
        assert_eq!(Pointer::parse("/list/2").unwrap().lookup(&doc), None);
    }

    #[test]
    fn join_and_starts_with() {
        let base = Pointer::parse("/components/schemas").unwrap();
        let child = base.join(&["Pet", "properties"]);
        assert_eq!(child.to_string(), "/components/schemas/Pet/properties");
        assert!(child.starts_with(&base));
        assert!(!base.starts_with(&child));
    }
}
