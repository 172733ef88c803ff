//! RESP Reply Vocabulary
//!
//! The gateway consumes only *request* frames (arrays of bulk strings,
//! decoded in [`parser`](super::parser)); everything it *produces* is one of
//! the reply shapes defined here. This is the wire-level vocabulary every
//! command translation must resolve into before the connection's flush path
//! commits it to the socket.
//!
//! ## Wire format
//!
//! Each reply starts with a type prefix byte and ends with CRLF (`\r\n`):
//!
//! - `+` simple status, e.g. `+OK\r\n`
//! - `-` error line, e.g. `-ERR syntax error\r\n`
//! - `:` signed 64-bit integer, e.g. `:1000\r\n`
//! - `$` bulk payload with explicit length, e.g. `$5\r\nhello\r\n`
//! - `$-1\r\n` null bulk (failed conditional writes, missing keys)
//! - `*` array of replies, e.g. the one `EXEC` unit

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP reply type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A single protocol reply.
///
/// Translations produce exactly one `RespValue` per request; the flush path
/// serializes it with [`serialize_into`](RespValue::serialize_into). `Null`
/// deliberately exists alongside `BulkString` because several store outcomes
/// (NX/XX conflicts, missing records) map to the null bulk, which carries no
/// payload at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary status line such as `OK` or `PONG`.
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// Error line. Gateway-origin errors carry an `ERR`-style prefix;
    /// store-origin messages are passed through verbatim.
    /// Format: `-<message>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe payload with explicit length.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Null bulk reply: `$-1\r\n`
    Null,

    /// Ordered sequence of replies, e.g. the single unit an `EXEC` flushes.
    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a status-line reply.
    ///
    /// # Example
    /// ```
    /// use relaykv::protocol::RespValue;
    /// let ok = RespValue::simple_string("OK");
    /// ```
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates an error reply.
    ///
    /// # Example
    /// ```
    /// use relaykv::protocol::RespValue;
    /// let err = RespValue::error("ERR syntax error");
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates an integer reply.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk reply.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Creates a bulk reply holding the decimal rendering of an integer.
    ///
    /// Some commands (ZINCRBY) are specified to return the new numeric value
    /// as a *string*, not as an integer reply.
    pub fn bulk_decimal(n: i64) -> Self {
        RespValue::BulkString(Bytes::from(n.to_string()))
    }

    /// Creates the null bulk reply.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Creates an array reply.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// The canonical success status.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Liveness reply for a bare `PING`.
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Acknowledgment for a command buffered inside an open `MULTI` unit.
    pub fn queued() -> Self {
        RespValue::SimpleString("QUEUED".to_string())
    }

    /// Serializes the reply to a fresh byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    ///
    /// The flush path reuses one buffer per connection, so this is the hot
    /// encoding entry point.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Returns true if this reply is an error line.
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, v) in values.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}
