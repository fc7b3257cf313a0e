use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::DecodeError;

/// Textual encodings understood by the node source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Strictly typed scalars.
    Json,
    /// Superset syntax; anchors and aliases are expanded on decode.
    Yaml,
}

impl Format {
    /// Pick a format from the location's extension, falling back to sniffing the bytes.
    pub fn detect(location: Option<&Url>, bytes: &[u8]) -> Self {
        if let Some(format) = location.and_then(Self::from_location) {
            return format;
        }
        Self::sniff(bytes)
    }

    /// Format implied by a location's file extension.
    pub fn from_location(location: &Url) -> Option<Self> {
        let path = location.path().to_ascii_lowercase();
        if path.ends_with(".json") {
            Some(Format::Json)
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }

    /// JSON when the first non-blank byte opens an object or array.
    pub fn sniff(bytes: &[u8]) -> Self {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') | Some(b'[') => Format::Json,
            _ => Format::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// Decode bytes into an untyped, order-preserving node tree.
pub fn decode(bytes: &[u8], format: Format) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_yaml::from_str(text)?)
        }
    }
}

/// Encode any serializable document (typed or untyped) back to bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<Vec<u8>, DecodeError> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_vec_pretty(value)?;
            out.push(b'\n');
            Ok(out)
        }
        Format::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_extension() {
        let json = Url::parse("file:///tmp/api.json").unwrap();
        let yaml = Url::parse("https://example.com/specs/api.YML").unwrap();
        assert_eq!(Format::detect(Some(&json), b"openapi: 3.0.0"), Format::Json);
        assert_eq!(Format::detect(Some(&yaml), b"{}"), Format::Yaml);
    }

    #[test]
    fn sniff_falls_back_to_content() {
        assert_eq!(Format::sniff(b"  \n{\"a\":1}"), Format::Json);
        assert_eq!(Format::sniff(b"[1]"), Format::Json);
        assert_eq!(Format::sniff(b"a: 1"), Format::Yaml);
        assert_eq!(Format::sniff(b""), Format::Yaml);
    }

    #[test]
    fn yaml_preserves_key_order() {
        let value = decode(b"zeta: 1\nalpha: 2\nmid: 3\n", Format::Yaml).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn yaml_aliases_are_expanded() {
        let doc = b"base: &b\n  type: string\ncopy: *b\n";
        let value = decode(doc, Format::Yaml).unwrap();
        assert_eq!(value["copy"]["type"], "string");
        assert_eq!(value["base"], value["copy"]);
    }

    #[test]
    fn json_is_strict() {
        assert!(matches!(
            decode(b"{a: 1}", Format::Json),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn non_utf8_is_rejected() {
        assert!(matches!(
            decode(&[0xff, 0xfe, 0x00], Format::Yaml),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn encode_then_decode_keeps_tree() {
        let value = decode(br#"{"b":[1,2,{"c":null}],"a":"x"}"#, Format::Json).unwrap();
        for format in [Format::Json, Format::Yaml] {
            let bytes = encode(&value, format).unwrap();
            assert_eq!(decode(&bytes, format).unwrap(), value);
        }
    }
}
