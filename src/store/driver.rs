//! Backing-Store Contract
//!
//! Everything the translation engine knows about the backing store is
//! defined here: record addressing ([`Key`]), single-bin writes ([`Bin`]),
//! per-request [`WritePolicy`], atomic [`Operation`]s against aggregate
//! bins, and the fixed [`ResultCode`] enumeration failures are classified
//! into. The [`StoreDriver`] trait is the seam: the engine holds one
//! process-wide `Arc<dyn StoreDriver>` and never names a concrete driver.
//!
//! Each driver call resolves to exactly one outcome. There are no partial
//! deliveries and no retries at this layer: a conditional-write refusal is
//! a normal, typed outcome, not a transient fault.

use crate::store::value::StoreValue;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// Full store address of a record.
///
/// The namespace and set come from the gateway's configured keyspace; the
/// user key is the protocol key argument, carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub namespace: String,
    pub set: String,
    pub user_key: Bytes,
}

impl Key {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>, user_key: Bytes) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            user_key,
        }
    }
}

/// A named field of a record, paired with its typed value for writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub name: String,
    pub value: StoreValue,
}

impl Bin {
    pub fn new(name: impl Into<String>, value: StoreValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Bin values returned by a read or operate completion.
///
/// Operate results are keyed by the bin the operation targeted. A record
/// that is present but lacks the expected bin is an error condition for the
/// caller, never a silent default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub bins: HashMap<String, StoreValue>,
}

impl Record {
    /// Builds a record holding a single bin, the shape every gateway
    /// operation produces.
    pub fn single(bin: impl Into<String>, value: StoreValue) -> Self {
        let mut bins = HashMap::new();
        bins.insert(bin.into(), value);
        Self { bins }
    }

    pub fn bin(&self, name: &str) -> Option<&StoreValue> {
        self.bins.get(name)
    }

    pub fn into_bin(mut self, name: &str) -> Option<StoreValue> {
        self.bins.remove(name)
    }
}

/// Record expiration carried by a write policy.
///
/// This is the store's integer TTL contract made explicit. On the wire the
/// four states are the sentinel integers `0` (namespace default), `-1`
/// (never expire), `-2` (keep the record's current TTL), and a positive
/// second count. `NamespaceDefault` is the *deliberate* resting state of
/// every write policy: a modifier-free overwrite re-applies the
/// namespace-default TTL instead of clearing expiry, and callers must not
/// "fix" that into `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Sentinel `0`: adopt the namespace's default TTL on write.
    #[default]
    NamespaceDefault,
    /// Sentinel `-1`: the record never expires.
    Never,
    /// Sentinel `-2`: leave the record's current TTL untouched.
    KeepExisting,
    /// Expire this many whole seconds after the write.
    Seconds(u32),
}

/// Conditional-existence mode of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistencePolicy {
    /// Write regardless of whether the record exists.
    #[default]
    Any,
    /// Fail with `KeyExists` if the record is already present.
    CreateOnly,
    /// Fail with `KeyNotFound` if the record is absent.
    UpdateOnly,
}

/// Per-request write policy.
///
/// Built fresh for every request from the default policy plus command
/// modifiers; never shared or mutated after the store call is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WritePolicy {
    pub expiration: Expiration,
    pub exists: ExistencePolicy,
}

/// One atomic operation against a record, scalar or aggregate.
///
/// These are the only operations the gateway issues; a driver implements
/// them server-side as single atomic steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Add `delta` to an integer scalar bin, creating it at `delta`.
    Add { bin: String, delta: i64 },
    /// Add `delta` to the integer value at `map_key` inside an aggregate
    /// bin, creating the entry at `delta`.
    MapIncrement {
        bin: String,
        map_key: StoreValue,
        delta: i64,
    },
    /// Insert members as map keys, skipping those already present.
    /// Result: count of newly inserted members.
    MapPutUnique {
        bin: String,
        members: Vec<StoreValue>,
    },
    /// Remove members from the map keys. Result: count removed.
    MapRemove {
        bin: String,
        members: Vec<StoreValue>,
    },
    /// Result: number of entries in the aggregate bin.
    MapSize { bin: String },
    /// Result: 1 if `map_key` is present, else 0.
    MapContainsKey { bin: String, map_key: StoreValue },
    /// Result: list of the aggregate bin's keys.
    MapKeys { bin: String },
}

impl Operation {
    /// Whether the operation mutates the record. Write operations create
    /// absent records; read-only operations on absent records fail
    /// `KeyNotFound`.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Add { .. }
                | Operation::MapIncrement { .. }
                | Operation::MapPutUnique { .. }
                | Operation::MapRemove { .. }
        )
    }

    /// The bin the operation targets (and keys its result under).
    pub fn bin(&self) -> &str {
        match self {
            Operation::Add { bin, .. }
            | Operation::MapIncrement { bin, .. }
            | Operation::MapPutUnique { bin, .. }
            | Operation::MapRemove { bin, .. }
            | Operation::MapSize { bin }
            | Operation::MapContainsKey { bin, .. }
            | Operation::MapKeys { bin } => bin,
        }
    }
}

/// The fixed outcome classification for failed store calls.
///
/// `KeyExists` and `KeyNotFound` are the two remappable signals:
/// conditional writes surface through them and several commands translate
/// them into non-error replies. Everything else passes through as a
/// protocol error carrying the store's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    KeyExists,
    KeyNotFound,
    ParameterError,
    ServerError,
}

/// A typed store failure: result code plus human-readable message.
///
/// The message travels to the peer verbatim when no per-command remap
/// applies, so drivers should phrase it as a complete error line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub code: ResultCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn key_exists() -> Self {
        Self::new(ResultCode::KeyExists, "key already exists")
    }

    pub fn key_not_found() -> Self {
        Self::new(ResultCode::KeyNotFound, "key not found")
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        Self::new(ResultCode::ParameterError, message)
    }
}

/// Asynchronous driver for the backing store.
///
/// One handle serves the whole process and is safe for concurrent use by
/// any number of in-flight command executions; implementations must not
/// require external locking. The embedded [`MemoryStore`] implements this
/// for development and tests; a production cluster client would implement
/// the same three calls.
///
/// [`MemoryStore`]: crate::store::MemoryStore
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Writes a single bin under `key`, honoring the policy's expiration
    /// sentinel and existence mode.
    async fn put(&self, policy: &WritePolicy, key: &Key, bin: Bin) -> Result<(), StoreError>;

    /// Point read. An absent record is `Ok(None)`, not an error.
    async fn get(&self, key: &Key) -> Result<Option<Record>, StoreError>;

    /// Executes one atomic operation, returning its result keyed by the
    /// targeted bin. Write operations create absent records; read-only
    /// operations on absent records fail `KeyNotFound`.
    async fn operate(
        &self,
        policy: &WritePolicy,
        key: &Key,
        op: Operation,
    ) -> Result<Option<Record>, StoreError>;
}
