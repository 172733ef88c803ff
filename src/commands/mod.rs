//! Command Translation Module
//!
//! This module is the heart of the gateway: it receives parsed requests and
//! re-expresses each one as a store operation, then translates the store's
//! outcome back into a protocol reply.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Decoder   │  (protocol module)
//! └────────┬────────┘
//!          │ RequestCommand
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │            CommandHandler               │
//! │                                         │
//! │  registry ──► descriptor (arity,        │
//! │               layout, reply rules)      │
//! │  policy   ──► WritePolicy from          │
//! │               modifier grammar          │
//! │  executor ──► one async store call      │
//! │  translate ─► RespValue                 │
//! └────────┬────────────────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   StoreDriver   │  (store module)
//! └─────────────────┘
//! ```
//!
//! Each supported command is described by a static descriptor
//! ([`registry::CommandSpec`]) giving its arity, argument layout, and reply
//! rules. One generic executor per command family consumes those
//! descriptors, so adding a command of an existing shape is a table entry,
//! not new control flow.
//!
//! ## Supported Commands
//!
//! - Scalar writes: `SET` (with `EX`/`PX`/`EXAT`/`PXAT`/`KEEPTTL`/`NX`/`XX`),
//!   `SETNX`, `SETEX`, `PSETEX`, plus `GET`
//! - Counters: `INCR`, `DECR`, `INCRBY`, `DECRBY`, `HINCRBY`, `ZINCRBY`
//! - Membership: `SADD`, `SREM`, `SCARD`, `SISMEMBER`, `SMEMBERS`
//! - Liveness: `PING`, `ECHO`
//! - Transactions: `MULTI`, `EXEC`, `DISCARD` (handled by the connection
//!   session; see the connection module)

pub mod counters;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod request;
pub mod sets;
pub mod strings;

pub use handler::{CommandHandler, Keyspace};
pub use request::{CommandKind, RequestCommand};

use crate::protocol::RespValue;
use crate::store::{CoerceError, StoreError};
use thiserror::Error;

/// Errors raised by the gateway itself before or after the store call.
///
/// The `Display` rendering of each variant is the exact wire text of the
/// error reply. Gateway-origin errors carry the protocol's `ERR`/`WRONGTYPE`
/// prefixes; store-origin messages pass through verbatim, never re-prefixed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR wrong number of arguments for '{name}' command (given {given})")]
    WrongArity { name: &'static str, given: usize },

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR invalid expire time in '{0}'")]
    InvalidExpire(&'static str),

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// The store reported success but the expected record or bin is absent.
    #[error("ERR failed to create a record")]
    MissingRecord,

    /// Store failure passed through with the store's own message.
    #[error("{0}")]
    Store(String),
}

impl CommandError {
    /// Renders this error as its wire-level reply.
    pub fn into_reply(self) -> RespValue {
        RespValue::error(self.to_string())
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Store(err.message)
    }
}

impl From<CoerceError> for CommandError {
    fn from(_: CoerceError) -> Self {
        CommandError::NotAnInteger
    }
}
