//! Store Layer
//!
//! Everything the translation engine knows about the record store lives
//! here, behind the [`StoreDriver`] trait:
//!
//! - `driver`: the driver contract, covering keys, bins, records, write
//!   policies with their expiration sentinels, operations, and result codes
//! - `value`: the typed value model and integer coercion rules
//! - `memory`: the embedded sharded driver used by the binary and tests
//!
//! Command handlers never talk to a store directly; they build policies and
//! operations, hand them to a driver, and translate the outcome back into
//! wire replies.

pub mod driver;
pub mod memory;
pub mod value;

pub use driver::{
    Bin, ExistencePolicy, Expiration, Key, Operation, Record, ResultCode, StoreDriver, StoreError,
    WritePolicy,
};
pub use memory::{MemoryStore, MemoryStoreStats};
pub use value::{parse_int, CoerceError, StoreValue};
