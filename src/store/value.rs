//! Store-Native Typed Values
//!
//! Protocol arguments arrive as raw bytes; the store speaks typed values.
//! This module is the coercion boundary between the two: strict parsing
//! where a command demands a particular kind (integer deltas, expiry
//! seconds), and auto-classification where the store decides how to type a
//! written value (so numeric strings become numeric bins, which is what
//! makes a later `INCR` on a `SET` key work).
//!
//! Coercion is side-effect free and never partial: either the whole byte
//! sequence parses as the requested kind, or it fails with a
//! [`CoerceError`].

use bytes::Bytes;
use thiserror::Error;

/// Error for arguments that do not parse as the requested kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoerceError {
    /// The byte sequence is not a complete base-10 integer in i64 range
    #[error("value is not an integer or out of range")]
    NotAnInteger,
}

/// A typed value as the store sees it.
///
/// `Int` covers both of the wire-level integer widths. `List` and `Map` are
/// the aggregate shapes a record read can surface; the gateway never
/// *constructs* them from protocol input, only receives them back from
/// operate results (map keys, whole aggregate bins).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreValue {
    /// Signed 64-bit integer
    Int(i64),
    /// UTF-8 text
    Str(String),
    /// Opaque binary payload
    Bytes(Bytes),
    /// Ordered collection, e.g. the key list of an aggregate bin
    List(Vec<StoreValue>),
    /// Aggregate bin contents as ordered key/value pairs
    Map(Vec<(StoreValue, StoreValue)>),
}

impl StoreValue {
    /// Auto-classifies a written value the way the store types bins.
    ///
    /// Only canonical decimal integers become `Int`: the decimal rendering
    /// must be byte-identical to the input, so `"007"`, `"+5"` and `"-0"`
    /// stay strings and read back exactly as written.
    pub fn detect(raw: Bytes) -> StoreValue {
        if let Ok(n) = parse_int(&raw) {
            if n.to_string().as_bytes() == &raw[..] {
                return StoreValue::Int(n);
            }
        }
        match std::str::from_utf8(&raw) {
            Ok(s) => StoreValue::Str(s.to_string()),
            Err(_) => StoreValue::Bytes(raw),
        }
    }

    /// Returns the integer payload, if this value is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StoreValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Renders a scalar value as wire bytes for a bulk reply.
    ///
    /// Aggregate shapes return `None`; a command that reads a scalar out of
    /// an aggregate bin must treat that as a wrong-type condition, not
    /// invent a rendering.
    pub fn scalar_bytes(&self) -> Option<Bytes> {
        match self {
            StoreValue::Int(n) => Some(Bytes::from(n.to_string())),
            StoreValue::Str(s) => Some(Bytes::from(s.clone())),
            StoreValue::Bytes(b) => Some(b.clone()),
            StoreValue::List(_) | StoreValue::Map(_) => None,
        }
    }
}

/// Strict base-10 integer coercion for integer-only arguments.
///
/// The whole sequence must parse; surrounding whitespace, embedded text, or
/// overflow all fail. This is the coercion behind expiry seconds, increment
/// deltas, and every other integer-typed modifier.
pub fn parse_int(raw: &[u8]) -> Result<i64, CoerceError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CoerceError::NotAnInteger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_accepts_plain_decimals() {
        assert_eq!(parse_int(b"0"), Ok(0));
        assert_eq!(parse_int(b"42"), Ok(42));
        assert_eq!(parse_int(b"-17"), Ok(-17));
        assert_eq!(parse_int(b"9223372036854775807"), Ok(i64::MAX));
    }

    #[test]
    fn test_parse_int_rejects_partial_and_padded() {
        assert_eq!(parse_int(b""), Err(CoerceError::NotAnInteger));
        assert_eq!(parse_int(b"12abc"), Err(CoerceError::NotAnInteger));
        assert_eq!(parse_int(b" 12"), Err(CoerceError::NotAnInteger));
        assert_eq!(parse_int(b"12 "), Err(CoerceError::NotAnInteger));
        assert_eq!(parse_int(b"1.5"), Err(CoerceError::NotAnInteger));
    }

    #[test]
    fn test_parse_int_rejects_overflow() {
        assert_eq!(
            parse_int(b"9223372036854775808"),
            Err(CoerceError::NotAnInteger)
        );
    }

    #[test]
    fn test_detect_canonical_integers() {
        assert_eq!(StoreValue::detect(Bytes::from("5")), StoreValue::Int(5));
        assert_eq!(
            StoreValue::detect(Bytes::from("-123")),
            StoreValue::Int(-123)
        );
    }

    #[test]
    fn test_detect_keeps_non_canonical_numerics_as_text() {
        // These parse as integers but would not read back byte-identical.
        assert_eq!(
            StoreValue::detect(Bytes::from("007")),
            StoreValue::Str("007".to_string())
        );
        assert_eq!(
            StoreValue::detect(Bytes::from("+5")),
            StoreValue::Str("+5".to_string())
        );
        assert_eq!(
            StoreValue::detect(Bytes::from("-0")),
            StoreValue::Str("-0".to_string())
        );
    }

    #[test]
    fn test_detect_text_and_binary() {
        assert_eq!(
            StoreValue::detect(Bytes::from("hello")),
            StoreValue::Str("hello".to_string())
        );
        let raw = Bytes::from(&b"\xff\xfe"[..]);
        assert_eq!(StoreValue::detect(raw.clone()), StoreValue::Bytes(raw));
    }

    #[test]
    fn test_scalar_bytes_rendering() {
        assert_eq!(
            StoreValue::Int(42).scalar_bytes(),
            Some(Bytes::from("42"))
        );
        assert_eq!(
            StoreValue::Str("hi".into()).scalar_bytes(),
            Some(Bytes::from("hi"))
        );
        assert_eq!(StoreValue::List(vec![]).scalar_bytes(), None);
        assert_eq!(StoreValue::Map(vec![]).scalar_bytes(), None);
    }
}
