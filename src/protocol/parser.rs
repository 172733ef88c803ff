//! Incremental RESP Request Decoder
//!
//! The gateway only ever *receives* one frame shape: a client request, which
//! on the wire is either a multibulk array of bulk strings
//! (`*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`) or an inline command line
//! (`PING\r\n`). This decoder turns complete frames into plain argument
//! vectors (`Vec<Bytes>`, command token at index 0) and leaves reply-side
//! encoding entirely to [`types`](super::types).
//!
//! ## How decoding works
//!
//! The decoder reads from a caller-owned buffer and returns:
//! - `Ok(Some((args, consumed)))` - one complete request, `consumed` bytes used
//! - `Ok(None)` - the frame is still incomplete, wait for more bytes
//! - `Err(ParseError)` - the peer violated the protocol
//!
//! The caller appends network data to its buffer, calls
//! [`RequestParser::parse`], advances the buffer by `consumed` on success,
//! and tears the connection down on error. Requests with an empty argument
//! vector (blank inline lines, `*0`) are valid frames the caller should
//! skip.

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors that can occur while decoding a request frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A length header did not parse as a decimal integer
    #[error("invalid length header: {0}")]
    InvalidLength(String),

    /// Invalid UTF-8 on an inline command line
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk argument length is negative or otherwise unusable
    #[error("invalid bulk length: {0}")]
    InvalidBulkLength(i64),

    /// Multibulk header count is negative or exceeds the argument limit
    #[error("invalid multibulk length: {0}")]
    InvalidMultibulkLength(i64),

    /// Protocol violation (wrong element prefix, missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A single argument exceeds the maximum allowed size
    #[error("argument too large: {size} bytes (max: {max})")]
    ArgumentTooLarge { size: usize, max: usize },
}

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk argument (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in a single request
pub const MAX_ARGS: usize = 1024 * 1024;

/// Incremental decoder for client request frames.
///
/// # Example
///
/// ```ignore
/// use relaykv::protocol::parser::RequestParser;
/// use bytes::{Buf, BytesMut};
///
/// let parser = RequestParser::new();
/// let mut buffer = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"[..]);
///
/// if let Some((args, consumed)) = parser.parse(&buffer)? {
///     buffer.advance(consumed);
///     assert_eq!(&args[0][..], b"GET");
/// }
/// ```
#[derive(Debug, Default)]
pub struct RequestParser;

impl RequestParser {
    /// Creates a new decoder instance.
    pub fn new() -> Self {
        Self
    }

    /// Attempts to decode one request from the buffer.
    ///
    /// Multibulk frames must be arrays of bulk strings; any other element
    /// type inside an array is a protocol violation. A leading byte other
    /// than `*` makes the line an inline command.
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if buf[0] == prefix::ARRAY {
            self.parse_multibulk(buf)
        } else {
            self.parse_inline(buf)
        }
    }

    /// Decodes a multibulk request: `*<count>\r\n` then `count` bulk args.
    fn parse_multibulk(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        let count_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let count_str = std::str::from_utf8(&buf[1..1 + count_end])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        let count: i64 = count_str
            .parse()
            .map_err(|e: ParseIntError| ParseError::InvalidLength(e.to_string()))?;

        if count < 0 || count as usize > MAX_ARGS {
            return Err(ParseError::InvalidMultibulkLength(count));
        }

        let count = count as usize;
        let mut args = Vec::with_capacity(count);
        let mut consumed = 1 + count_end + 2; // *<count>\r\n

        for _ in 0..count {
            if consumed >= buf.len() {
                return Ok(None); // Incomplete
            }
            match self.parse_bulk_arg(&buf[consumed..])? {
                Some((arg, arg_consumed)) => {
                    args.push(arg);
                    consumed += arg_consumed;
                }
                None => return Ok(None), // Incomplete
            }
        }

        Ok(Some((args, consumed)))
    }

    /// Decodes one bulk argument: `$<length>\r\n<data>\r\n`.
    ///
    /// Requests carry no null bulks, so a negative length is a violation.
    fn parse_bulk_arg(&self, buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
        if buf[0] != prefix::BULK_STRING {
            return Err(ParseError::ProtocolError(format!(
                "expected '$', got {:#04x}",
                buf[0]
            )));
        }

        let length_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let length_str = std::str::from_utf8(&buf[1..1 + length_end])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        let length: i64 = length_str
            .parse()
            .map_err(|e: ParseIntError| ParseError::InvalidLength(e.to_string()))?;

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > MAX_BULK_SIZE {
            return Err(ParseError::ArgumentTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let data_start = 1 + length_end + 2; // prefix + length + CRLF
        let total_needed = data_start + length + 2; // data + CRLF
        if buf.len() < total_needed {
            return Ok(None); // Incomplete
        }

        if &buf[data_start + length..data_start + length + 2] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk argument missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
        Ok(Some((data, total_needed)))
    }

    /// Decodes an inline command: a whitespace-separated line.
    ///
    /// A blank line decodes to an empty argument vector, which the caller
    /// skips without replying.
    fn parse_inline(&self, buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
        let crlf_pos = match find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let line = std::str::from_utf8(&buf[..crlf_pos])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

        let args: Vec<Bytes> = line
            .split_whitespace()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect();

        Ok(Some((args, crlf_pos + 2)))
    }
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    for i in 0..buf.len().saturating_sub(1) {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some(i);
        }
    }
    None
}

/// Decodes a single request from a byte slice.
///
/// Convenience entry point for tests and benchmarks.
pub fn parse_request(buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
    RequestParser::new().parse(buf)
}
