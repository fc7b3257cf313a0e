use std::fmt;

use crate::error::{ReferenceError, Result};
use crate::pointer::Pointer;

/// A parsed `$ref` string: `<document-locator>#<json-pointer>`.
///
/// An empty locator means "this document". A reference without `#` addresses
/// the whole target document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    locator: String,
    pointer: Pointer,
}

impl Reference {
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(ReferenceError::Empty);
        }
        let (locator, fragment) = match text.split_once('#') {
            Some((locator, fragment)) => (locator, fragment),
            None => (text, ""),
        };
        let fragment = percent_decode(fragment)?;
        let pointer = Pointer::parse(&fragment)?;
        Ok(Self {
            locator: locator.to_string(),
            pointer,
        })
    }

    /// Relative or absolute location of the target document; empty for this document.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn is_local(&self) -> bool {
        self.locator.is_empty()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.pointer)
    }
}

fn percent_decode(text: &str) -> Result<String> {
    let invalid = || ReferenceError::InvalidPercentEncoding(text.to_string());
    let bytes = text.as_bytes();
    for (at, _) in text.match_indices('%') {
        let escape = bytes.get(at + 1..at + 3).ok_or_else(invalid)?;
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return Err(invalid());
        }
    }
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_reference() {
        let reference = Reference::parse("#/components/schemas/B").unwrap();
        assert!(reference.is_local());
        assert_eq!(reference.pointer().tokens(), ["components", "schemas", "B"]);
    }

    #[test]
    fn external_reference_with_fragment() {
        let reference = Reference::parse("common/pet.yaml#/Pet").unwrap();
        assert!(!reference.is_local());
        assert_eq!(reference.locator(), "common/pet.yaml");
        assert_eq!(reference.pointer().tokens(), ["Pet"]);
    }

    #[test]
    fn whole_document_reference() {
        let reference = Reference::parse("https://example.com/schemas/pet.json").unwrap();
        assert_eq!(reference.locator(), "https://example.com/schemas/pet.json");
        assert!(reference.pointer().is_root());

        let reference = Reference::parse("pet.json#").unwrap();
        assert!(reference.pointer().is_root());
    }

    #[test]
    fn percent_encoded_fragment() {
        let reference = Reference::parse("#/paths/~1items~1%7Bid%7D").unwrap();
        assert_eq!(reference.pointer().tokens(), ["paths", "/items/{id}"]);
        assert!(matches!(
            Reference::parse("#/components/schemas/a%+fb"),
            Err(ReferenceError::InvalidPercentEncoding(_))
        ));
        assert!(matches!(
            Reference::parse("#/trailing%4"),
            Err(ReferenceError::InvalidPercentEncoding(_))
        ));
        assert!(matches!(
            Reference::parse("#/not-utf8%FF"),
            Err(ReferenceError::InvalidPercentEncoding(_))
        ));
        assert!(matches!(
            Reference::parse("#/bad%zz"),
            Err(ReferenceError::InvalidPercentEncoding(_))
        ));
    }

    #[test]
    fn malformed_references() {
        assert_eq!(Reference::parse(""), Err(ReferenceError::Empty));
        assert!(matches!(
            Reference::parse("#components/schemas/B"),
            Err(ReferenceError::NotAbsolute(_))
        ));
        assert!(matches!(
            Reference::parse("#/a~9"),
            Err(ReferenceError::InvalidEscape(_))
        ));
    }

    #[test]
    fn display_is_canonical() {
        let reference = Reference::parse("a.yaml#/x~1y").unwrap();
        assert_eq!(reference.to_string(), "a.yaml#/x~1y");
    }
}
