//! RESP Wire Protocol
//!
//! The client-facing half of the gateway speaks RESP (Redis Serialization
//! Protocol). The split here mirrors the direction of traffic: requests are
//! *decoded* into argument vectors, replies are *encoded* from
//! [`RespValue`]s. There is no shared bidirectional value type: the two
//! sides accept different grammars (a server never receives an integer or
//! error frame, and never sends a multibulk of raw arguments).
//!
//! ## Modules
//!
//! - `types`: the reply vocabulary (`RespValue`) and its wire encoding
//! - `parser`: incremental decoder for multibulk and inline requests
//!
//! ## Example
//!
//! ```ignore
//! use relaykv::protocol::{parse_request, RespValue};
//!
//! // Decoding an incoming request
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (args, consumed) = parse_request(data).unwrap().unwrap();
//!
//! // Encoding a reply
//! let reply = RespValue::ok();
//! let bytes = reply.serialize();
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_request, ParseError, ParseResult, RequestParser};
pub use types::RespValue;
