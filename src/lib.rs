//! # RelayKV - A Redis Front Door for a Record-Oriented Store
//!
//! RelayKV speaks the Redis wire protocol (RESP) on one side and a
//! generic record store interface on the other. Clients keep using the
//! Redis commands and client libraries they already have, while every
//! key lands in a namespaced record store behind the [`store::StoreDriver`]
//! trait. The crate ships an embedded in-memory driver, so it also runs
//! standalone as a small Redis-compatible server.
//!
//! ## Features
//!
//! - **Redis-Compatible**: RESP requests and replies, inline commands,
//!   pipelining, and MULTI/EXEC transaction blocks
//! - **Record Translation**: Each command is described by a declarative
//!   descriptor and executed by one generic routine per command family
//! - **Pluggable Storage**: Any backend implementing [`store::StoreDriver`]
//!   can sit behind the protocol front end
//! - **Async I/O**: Built on Tokio; each connection runs a read loop and
//!   a flush loop so slow commands never stall parsing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              RelayKV                                │
//! │                                                                     │
//! │  ┌─────────────┐    ┌──────────────────────┐    ┌─────────────┐     │
//! │  │ TCP Server  │───>│ read loop/flush loop │───>│  Command    │     │
//! │  │ (Listener)  │    │ (ordered reply slots)│    │  Handler    │     │
//! │  └─────────────┘    └──────────────────────┘    └──────┬──────┘     │
//! │                                                        │            │
//! │  ┌─────────────┐    ┌─────────────────────┐            ▼            │
//! │  │   RESP      │    │  command registry   │    ┌──────────────┐     │
//! │  │   Parser    │    │  (one descriptor    │───>│ StoreDriver  │     │
//! │  │             │    │   per command)      │    │   (trait)    │     │
//! │  └─────────────┘    └─────────────────────┘    └──────┬───────┘     │
//! │                                                       │             │
//! │                     ┌─────────────────────────────────▼──────────┐  │
//! │                     │               MemoryStore                  │  │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐ ┌─────┐  │  │
//! │                     │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N │  │  │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │     │  │  │
//! │                     │  └────────┘ └────────┘ └────────┘ └─────┘  │  │
//! │                     └────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaykv::commands::{CommandHandler, Keyspace};
//! use relaykv::connection::handle_connection;
//! use relaykv::store::MemoryStore;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Embedded in-memory backend; swap in any StoreDriver here
//!     let store = Arc::new(MemoryStore::new());
//!     let handler = CommandHandler::new(store, Keyspace::default());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         tokio::spawn(handle_connection(stream, addr, handler.clone()));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value [EX s] [PX ms] [EXAT ts] [PXAT ts] [KEEPTTL] [NX|XX]`
//! - `SETNX key value`
//! - `SETEX key seconds value` / `PSETEX key milliseconds value`
//! - `GET key`
//!
//! ### Counter Commands
//! - `INCR key` / `DECR key`
//! - `INCRBY key increment` / `DECRBY key decrement`
//! - `HINCRBY key field increment`
//! - `ZINCRBY key increment member`
//!
//! ### Set Commands
//! - `SADD key member [member ...]`
//! - `SREM key member [member ...]`
//! - `SCARD key`
//! - `SISMEMBER key member`
//! - `SMEMBERS key`
//!
//! ### Connection Commands
//! - `PING [message]` / `ECHO message`
//! - `MULTI` / `EXEC` / `DISCARD`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP frame parser and reply types
//! - [`store`]: The record-store interface and the embedded memory driver
//! - [`commands`]: Command descriptors and the translation layer
//! - [`connection`]: Per-client read and flush loops, transactions
//!
//! ## Design Highlights
//!
//! ### One Descriptor per Command
//!
//! Commands are data, not code: each one is a const descriptor naming its
//! arity, reply shape, and store operation. A handful of generic
//! executors (writes, reads, counters, membership) interpret the
//! descriptors, so adding a command rarely means adding a branch.
//!
//! ### Ordered Pipelining
//!
//! Replies must leave in submission order even when commands finish out
//! of order. The read loop reserves a reply slot per command and a
//! dedicated flush task drains slots in reservation order.
//!
//! ### Lazy Expiry
//!
//! The embedded store tracks per-record absolute deadlines and reaps
//! expired records on access, the same contract a remote record store
//! would enforce server-side.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod store;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, Keyspace};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RequestParser, RespValue};
pub use store::{MemoryStore, StoreDriver};

/// The default port RelayKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host RelayKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of RelayKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
