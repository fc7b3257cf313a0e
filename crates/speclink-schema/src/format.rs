use std::net::{Ipv4Addr, Ipv6Addr};

use serde_json::Value;

pub(crate) const EMAIL: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
pub(crate) const BASE64: &str = r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";

/// How a named format is asserted.
pub(crate) enum Check {
    /// Not a format this validator knows; always passes.
    Unknown,
    /// Passes or fails outright.
    Done(Option<String>),
    /// Match the string against this regular expression.
    Pattern(&'static str),
}

/// Assert `format` on `instance`. Formats only constrain the instance types
/// they describe; other instances pass.
pub(crate) fn check(format: &str, instance: &Value) -> Check {
    match (format, instance) {
        ("date", Value::String(s)) => Check::Done(
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .err()
                .map(|_| format!("{s:?} is not a full-date")),
        ),
        ("date-time", Value::String(s)) => Check::Done(
            chrono::DateTime::parse_from_rfc3339(s)
                .err()
                .map(|_| format!("{s:?} is not an RFC 3339 date-time")),
        ),
        ("uuid", Value::String(s)) => {
            let valid = s.len() == 36 && uuid::Uuid::try_parse(s).is_ok();
            Check::Done((!valid).then(|| format!("{s:?} is not a UUID")))
        }
        ("ipv4", Value::String(s)) => Check::Done(
            s.parse::<Ipv4Addr>()
                .err()
                .map(|_| format!("{s:?} is not an IPv4 address")),
        ),
        ("ipv6", Value::String(s)) => Check::Done(
            s.parse::<Ipv6Addr>()
                .err()
                .map(|_| format!("{s:?} is not an IPv6 address")),
        ),
        ("email", Value::String(_)) => Check::Pattern(EMAIL),
        ("byte", Value::String(_)) => Check::Pattern(BASE64),
        ("int32", Value::Number(_)) => Check::Done(integer_range(
            instance,
            i64::from(i32::MIN),
            i64::from(i32::MAX),
            "int32",
        )),
        ("int64", Value::Number(_)) => {
            Check::Done(integer_range(instance, i64::MIN, i64::MAX, "int64"))
        }
        _ => Check::Unknown,
    }
}

fn integer_range(instance: &Value, min: i64, max: i64, name: &str) -> Option<String> {
    let in_range = match instance.as_i64() {
        Some(n) => (min..=max).contains(&n),
        None => instance
            .as_f64()
            .is_some_and(|n| n.fract() == 0.0 && n >= min as f64 && n <= max as f64),
    };
    (!in_range).then(|| format!("{instance} is not a valid {name}"))
}
