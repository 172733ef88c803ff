//! Connection Handling Module
//!
//! This module manages individual client connections to RelayKV.
//! Each accepted socket is split into two cooperating tasks so that
//! reading commands and writing replies never block each other.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                      (main.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │  one task per client   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ into_split()
//!         ┌──────────────┴───────────────┐
//!         ▼                              ▼
//! ┌───────────────────────┐   ┌──────────────────────────┐
//! │       read loop       │   │        flush loop        │
//! │  parse RESP frames,   │   │  await reply slots in    │
//! │  reserve reply slot,  │   │  submission order and    │
//! │  spawn executor task  │   │  write encoded replies   │
//! └───────────┬───────────┘   └──────────────────────────┘
//!             │ per command                ▲
//!             ▼                            │ oneshot
//!     ┌────────────────┐                   │
//!     │ CommandHandler │───────────────────┘
//!     └────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Pipelining**: Clients may send many commands without waiting;
//!   replies are written strictly in submission order
//! - **Split halves**: Reading and writing run as independent tasks,
//!   so a slow store operation never stalls frame parsing
//! - **Transactions**: MULTI/EXEC queueing lives beside the read loop,
//!   where submission order is decided
//! - **Statistics**: Per-connection counters, logged at disconnect
//!
//! ## Example
//!
//! ```ignore
//! use relaykv::connection::handle_connection;
//! use relaykv::commands::{CommandHandler, Keyspace};
//! use relaykv::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let handler = CommandHandler::new(store, Keyspace::default());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone()));
//! ```

pub mod handler;
pub mod reply;

use thiserror::Error;

use crate::protocol::ParseError;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionStats};
pub use reply::{flush_loop, ReplyQueue, ReplySlot, SlotReceiver};

/// Errors that can occur during connection handling
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Reply slot dropped before completion")]
    ReplyDropped,

    #[error("Reply writer is gone")]
    WriterGone,

    #[error("Reply writer task failed")]
    WriterTask,
}
