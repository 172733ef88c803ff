//! Embedded In-Memory Store Driver
//!
//! A self-contained [`StoreDriver`] used by the shipped binary and the test
//! suite. It honors the full driver contract, from existence modes and
//! expiration sentinels (including namespace default-TTL on write) through
//! the atomic bin operations, so the translation engine behaves identically
//! against it and against a real cluster client.
//!
//! ## Concurrency model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     MemoryStore                     │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐   │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │   │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │   │
//! │  │ records │ │ records │ │ records │ │ records │   │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Records are distributed across shards by key hash; each operation takes
//! exactly one shard lock and never holds it across an await point, so the
//! driver is safe for any number of concurrent command executions. Expired
//! records are reaped lazily on access.

use crate::store::driver::{
    Bin, ExistencePolicy, Expiration, Key, Operation, Record, StoreDriver, StoreError, WritePolicy,
};
use crate::store::value::StoreValue;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Number of shards. The embedded driver is a development stand-in, so a
/// modest count keeps memory overhead low while still spreading contention.
const NUM_SHARDS: usize = 16;

/// Contents of one bin: either a scalar value or an aggregate map.
///
/// Aggregates are kept as ordered maps so key listings are deterministic.
#[derive(Debug, Clone)]
enum BinContent {
    Scalar(StoreValue),
    Aggregate(BTreeMap<StoreValue, StoreValue>),
}

impl BinContent {
    fn to_value(&self) -> StoreValue {
        match self {
            BinContent::Scalar(v) => v.clone(),
            BinContent::Aggregate(map) => {
                StoreValue::Map(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
        }
    }
}

/// A stored record: its bins plus an optional absolute expiry deadline.
#[derive(Debug, Clone)]
struct RecordEntry {
    bins: HashMap<String, BinContent>,
    expires_at: Option<Instant>,
}

impl RecordEntry {
    fn new(expires_at: Option<Instant>) -> Self {
        Self {
            bins: HashMap::new(),
            expires_at,
        }
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }

    fn to_record(&self) -> Record {
        Record {
            bins: self
                .bins
                .iter()
                .map(|(name, content)| (name.clone(), content.to_value()))
                .collect(),
        }
    }
}

#[derive(Debug)]
struct Shard {
    records: RwLock<HashMap<Key, RecordEntry>>,
}

impl Shard {
    fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

/// Counters exposed for shutdown logging and tests.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStoreStats {
    pub records: u64,
    pub puts: u64,
    pub gets: u64,
    pub operates: u64,
    pub expired: u64,
}

/// Sharded in-memory implementation of the store contract.
///
/// # Example
///
/// ```ignore
/// use relaykv::store::{Bin, Key, MemoryStore, StoreDriver, StoreValue, WritePolicy};
/// use bytes::Bytes;
///
/// let store = MemoryStore::new();
/// let key = Key::new("test", "redis", Bytes::from("greeting"));
/// let bin = Bin::new("data", StoreValue::Str("hello".into()));
/// store.put(&WritePolicy::default(), &key, bin).await?;
/// ```
pub struct MemoryStore {
    shards: Vec<Shard>,

    /// Namespace default TTL, applied when a write policy carries
    /// `Expiration::NamespaceDefault`. `None` means such records never
    /// expire.
    default_ttl: Option<Duration>,

    record_count: AtomicU64,
    put_count: AtomicU64,
    get_count: AtomicU64,
    operate_count: AtomicU64,
    expired_count: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("shards", &self.shards.len())
            .field("default_ttl", &self.default_ttl)
            .field("records", &self.record_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a store whose namespace default is "never expire".
    pub fn new() -> Self {
        Self::with_default_ttl(None)
    }

    /// Creates a store with an explicit namespace default TTL.
    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::new()).collect();
        Self {
            shards,
            default_ttl,
            record_count: AtomicU64::new(0),
            put_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            operate_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &Key) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    fn default_deadline(&self) -> Option<Instant> {
        self.default_ttl.map(|ttl| Instant::now() + ttl)
    }

    /// Resolves a policy expiration into an absolute deadline.
    ///
    /// `existing` is the current deadline of the record being overwritten,
    /// or `None` when the write creates the record. In that case
    /// `KeepExisting` has nothing to keep and falls back to the namespace
    /// default.
    fn resolve_expiry(
        &self,
        expiration: Expiration,
        existing: Option<Option<Instant>>,
    ) -> Option<Instant> {
        match expiration {
            Expiration::NamespaceDefault => self.default_deadline(),
            Expiration::Never => None,
            Expiration::KeepExisting => match existing {
                Some(current) => current,
                None => self.default_deadline(),
            },
            Expiration::Seconds(secs) => Some(Instant::now() + Duration::from_secs(secs.into())),
        }
    }

    /// Removes the record under `key` if it has expired.
    fn reap_if_expired(&self, records: &mut HashMap<Key, RecordEntry>, key: &Key) {
        if records.get(key).map(|e| e.is_expired()).unwrap_or(false) {
            records.remove(key);
            self.record_count.fetch_sub(1, Ordering::Relaxed);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Applies one operation to a record's bins, returning the result value.
    fn apply_op(entry: &mut RecordEntry, op: &Operation) -> Result<StoreValue, StoreError> {
        match op {
            Operation::Add { bin, delta } => match entry.bins.get_mut(bin) {
                None => {
                    entry
                        .bins
                        .insert(bin.clone(), BinContent::Scalar(StoreValue::Int(*delta)));
                    Ok(StoreValue::Int(*delta))
                }
                Some(BinContent::Scalar(StoreValue::Int(n))) => {
                    let new = n
                        .checked_add(*delta)
                        .ok_or_else(|| StoreError::parameter("bin arithmetic overflow"))?;
                    *n = new;
                    Ok(StoreValue::Int(new))
                }
                Some(BinContent::Scalar(_)) => Err(StoreError::parameter("bin is not an integer")),
                Some(BinContent::Aggregate(_)) => {
                    Err(StoreError::parameter("bin holds an aggregate value"))
                }
            },

            Operation::MapIncrement {
                bin,
                map_key,
                delta,
            } => {
                let map = Self::aggregate_bin(entry, bin)?;
                match map.get_mut(map_key) {
                    None => {
                        map.insert(map_key.clone(), StoreValue::Int(*delta));
                        Ok(StoreValue::Int(*delta))
                    }
                    Some(StoreValue::Int(n)) => {
                        let new = n
                            .checked_add(*delta)
                            .ok_or_else(|| StoreError::parameter("map value overflow"))?;
                        *n = new;
                        Ok(StoreValue::Int(new))
                    }
                    Some(_) => Err(StoreError::parameter("map value is not an integer")),
                }
            }

            Operation::MapPutUnique { bin, members } => {
                let map = Self::aggregate_bin(entry, bin)?;
                let mut added = 0i64;
                for member in members {
                    if !map.contains_key(member) {
                        map.insert(member.clone(), StoreValue::Int(1));
                        added += 1;
                    }
                }
                Ok(StoreValue::Int(added))
            }

            Operation::MapRemove { bin, members } => {
                let mut removed = 0i64;
                if let Some(BinContent::Scalar(_)) = entry.bins.get(bin) {
                    return Err(StoreError::parameter("bin is not a map"));
                }
                if let Some(BinContent::Aggregate(map)) = entry.bins.get_mut(bin) {
                    for member in members {
                        if map.remove(member).is_some() {
                            removed += 1;
                        }
                    }
                    if map.is_empty() {
                        entry.bins.remove(bin);
                    }
                }
                Ok(StoreValue::Int(removed))
            }

            Operation::MapSize { bin } => match entry.bins.get(bin) {
                None => Ok(StoreValue::Int(0)),
                Some(BinContent::Aggregate(map)) => Ok(StoreValue::Int(map.len() as i64)),
                Some(BinContent::Scalar(_)) => Err(StoreError::parameter("bin is not a map")),
            },

            Operation::MapContainsKey { bin, map_key } => match entry.bins.get(bin) {
                None => Ok(StoreValue::Int(0)),
                Some(BinContent::Aggregate(map)) => {
                    Ok(StoreValue::Int(i64::from(map.contains_key(map_key))))
                }
                Some(BinContent::Scalar(_)) => Err(StoreError::parameter("bin is not a map")),
            },

            Operation::MapKeys { bin } => match entry.bins.get(bin) {
                None => Ok(StoreValue::List(Vec::new())),
                Some(BinContent::Aggregate(map)) => {
                    Ok(StoreValue::List(map.keys().cloned().collect()))
                }
                Some(BinContent::Scalar(_)) => Err(StoreError::parameter("bin is not a map")),
            },
        }
    }

    /// Gets or creates the aggregate map of `bin`, rejecting scalar bins.
    fn aggregate_bin<'a>(
        entry: &'a mut RecordEntry,
        bin: &str,
    ) -> Result<&'a mut BTreeMap<StoreValue, StoreValue>, StoreError> {
        if !entry.bins.contains_key(bin) {
            entry
                .bins
                .insert(bin.to_string(), BinContent::Aggregate(BTreeMap::new()));
        }
        match entry.bins.get_mut(bin) {
            Some(BinContent::Aggregate(map)) => Ok(map),
            _ => Err(StoreError::parameter("bin is not a map")),
        }
    }

    /// Remaining lifetime of the record under `key`.
    ///
    /// `None` means no such record; `Some(None)` means the record never
    /// expires. Useful for inspecting TTL behavior in tests and tooling.
    pub fn remaining_ttl(&self, key: &Key) -> Option<Option<Duration>> {
        let shard = self.shard(key);
        let records = shard.records.read().unwrap();
        let entry = records.get(key)?;
        if entry.is_expired() {
            return None;
        }
        Some(
            entry
                .expires_at
                .map(|deadline| deadline.saturating_duration_since(Instant::now())),
        )
    }

    /// Approximate number of live records.
    pub fn len(&self) -> u64 {
        self.record_count.load(Ordering::Relaxed)
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the driver's counters.
    pub fn stats(&self) -> MemoryStoreStats {
        MemoryStoreStats {
            records: self.record_count.load(Ordering::Relaxed),
            puts: self.put_count.load(Ordering::Relaxed),
            gets: self.get_count.load(Ordering::Relaxed),
            operates: self.operate_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl StoreDriver for MemoryStore {
    async fn put(&self, policy: &WritePolicy, key: &Key, bin: Bin) -> Result<(), StoreError> {
        self.put_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.shard(key);
        let mut records = shard.records.write().unwrap();
        self.reap_if_expired(&mut records, key);

        match records.get_mut(key) {
            Some(entry) => {
                if policy.exists == ExistencePolicy::CreateOnly {
                    return Err(StoreError::key_exists());
                }
                entry.expires_at = self.resolve_expiry(policy.expiration, Some(entry.expires_at));
                entry
                    .bins
                    .insert(bin.name, BinContent::Scalar(bin.value));
            }
            None => {
                if policy.exists == ExistencePolicy::UpdateOnly {
                    return Err(StoreError::key_not_found());
                }
                let mut entry = RecordEntry::new(self.resolve_expiry(policy.expiration, None));
                entry
                    .bins
                    .insert(bin.name, BinContent::Scalar(bin.value));
                records.insert(key.clone(), entry);
                self.record_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    async fn get(&self, key: &Key) -> Result<Option<Record>, StoreError> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.shard(key);

        // Fast path: read lock for live records.
        {
            let records = shard.records.read().unwrap();
            match records.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.to_record())),
                None => return Ok(None),
                _ => {} // expired, needs a write lock to reap
            }
        }

        let mut records = shard.records.write().unwrap();
        if let Some(entry) = records.get(key) {
            if entry.is_expired() {
                records.remove(key);
                self.record_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            // Another task may have rewritten the record in between.
            return Ok(Some(entry.to_record()));
        }

        Ok(None)
    }

    async fn operate(
        &self,
        policy: &WritePolicy,
        key: &Key,
        op: Operation,
    ) -> Result<Option<Record>, StoreError> {
        self.operate_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.shard(key);
        let mut records = shard.records.write().unwrap();
        self.reap_if_expired(&mut records, key);

        match records.get_mut(key) {
            Some(entry) => {
                if policy.exists == ExistencePolicy::CreateOnly {
                    return Err(StoreError::key_exists());
                }
                if op.is_write() {
                    entry.expires_at =
                        self.resolve_expiry(policy.expiration, Some(entry.expires_at));
                }
                let result = Self::apply_op(entry, &op)?;
                // A record whose last bin was removed is gone entirely.
                if entry.bins.is_empty() {
                    records.remove(key);
                    self.record_count.fetch_sub(1, Ordering::Relaxed);
                }
                Ok(Some(Record::single(op.bin(), result)))
            }
            None => {
                if !op.is_write() || policy.exists == ExistencePolicy::UpdateOnly {
                    return Err(StoreError::key_not_found());
                }
                let mut entry = RecordEntry::new(self.resolve_expiry(policy.expiration, None));
                let result = Self::apply_op(&mut entry, &op)?;
                if !entry.bins.is_empty() {
                    records.insert(key.clone(), entry);
                    self.record_count.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Some(Record::single(op.bin(), result)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::driver::ResultCode;
    use bytes::Bytes;

    fn key(name: &str) -> Key {
        Key::new("test", "redis", Bytes::from(name.to_string()))
    }

    fn data_bin(value: StoreValue) -> Bin {
        Bin::new("data", value)
    }

    fn policy(exists: ExistencePolicy, expiration: Expiration) -> WritePolicy {
        WritePolicy { expiration, exists }
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let store = MemoryStore::new();
        let k = key("greeting");

        store
            .put(
                &WritePolicy::default(),
                &k,
                data_bin(StoreValue::Str("hello".into())),
            )
            .await
            .unwrap();

        let record = store.get(&k).await.unwrap().unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Str("hello".into())));
    }

    #[tokio::test]
    async fn test_get_missing_record_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&key("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_only_rejects_existing() {
        let store = MemoryStore::new();
        let k = key("once");
        let create = policy(ExistencePolicy::CreateOnly, Expiration::NamespaceDefault);

        store
            .put(&create, &k, data_bin(StoreValue::Str("v1".into())))
            .await
            .unwrap();

        let err = store
            .put(&create, &k, data_bin(StoreValue::Str("v2".into())))
            .await
            .unwrap_err();
        assert_eq!(err.code, ResultCode::KeyExists);

        // The refused write must not have touched the record.
        let record = store.get(&k).await.unwrap().unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Str("v1".into())));
    }

    #[tokio::test]
    async fn test_update_only_requires_existing() {
        let store = MemoryStore::new();
        let update = policy(ExistencePolicy::UpdateOnly, Expiration::NamespaceDefault);

        let err = store
            .put(&update, &key("absent"), data_bin(StoreValue::Int(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ResultCode::KeyNotFound);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_namespace_default_ttl_applied() {
        let store = MemoryStore::with_default_ttl(Some(Duration::from_millis(50)));
        let k = key("short-lived");

        store
            .put(&WritePolicy::default(), &k, data_bin(StoreValue::Int(1)))
            .await
            .unwrap();
        assert!(store.remaining_ttl(&k).unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.get(&k).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keep_existing_preserves_expiry() {
        let store = MemoryStore::new();
        let k = key("keep");

        store
            .put(
                &policy(ExistencePolicy::Any, Expiration::Seconds(100)),
                &k,
                data_bin(StoreValue::Str("v1".into())),
            )
            .await
            .unwrap();

        store
            .put(
                &policy(ExistencePolicy::Any, Expiration::KeepExisting),
                &k,
                data_bin(StoreValue::Str("v2".into())),
            )
            .await
            .unwrap();

        let ttl = store.remaining_ttl(&k).unwrap().unwrap();
        assert!(ttl > Duration::from_secs(90) && ttl <= Duration::from_secs(100));

        // A default-expiration overwrite re-applies the namespace default,
        // which for this store is "never expire".
        store
            .put(&WritePolicy::default(), &k, data_bin(StoreValue::Str("v3".into())))
            .await
            .unwrap();
        assert_eq!(store.remaining_ttl(&k), Some(None));
    }

    #[tokio::test]
    async fn test_never_clears_expiry() {
        let store = MemoryStore::with_default_ttl(Some(Duration::from_secs(30)));
        let k = key("pinned");

        store
            .put(&WritePolicy::default(), &k, data_bin(StoreValue::Int(1)))
            .await
            .unwrap();
        assert!(store.remaining_ttl(&k).unwrap().is_some());

        store
            .put(
                &policy(ExistencePolicy::Any, Expiration::Never),
                &k,
                data_bin(StoreValue::Int(2)),
            )
            .await
            .unwrap();
        assert_eq!(store.remaining_ttl(&k), Some(None));
    }

    #[tokio::test]
    async fn test_add_operation_creates_and_accumulates() {
        let store = MemoryStore::new();
        let k = key("counter");
        let add = |delta| Operation::Add {
            bin: "data".into(),
            delta,
        };

        let record = store
            .operate(&WritePolicy::default(), &k, add(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(5)));

        let record = store
            .operate(&WritePolicy::default(), &k, add(-2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(3)));
    }

    #[tokio::test]
    async fn test_add_on_text_bin_is_parameter_error() {
        let store = MemoryStore::new();
        let k = key("text");

        store
            .put(
                &WritePolicy::default(),
                &k,
                data_bin(StoreValue::Str("hello".into())),
            )
            .await
            .unwrap();

        let err = store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::Add {
                    bin: "data".into(),
                    delta: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ResultCode::ParameterError);
    }

    #[tokio::test]
    async fn test_map_increment_creates_entry_then_accumulates() {
        let store = MemoryStore::new();
        let k = key("hash");
        let incr = |delta| Operation::MapIncrement {
            bin: "data".into(),
            map_key: StoreValue::Str("field".into()),
            delta,
        };

        let record = store
            .operate(&WritePolicy::default(), &k, incr(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(5)));

        let record = store
            .operate(&WritePolicy::default(), &k, incr(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(8)));
    }

    #[tokio::test]
    async fn test_map_increment_on_scalar_bin_rejected() {
        let store = MemoryStore::new();
        let k = key("scalar");

        store
            .put(&WritePolicy::default(), &k, data_bin(StoreValue::Int(7)))
            .await
            .unwrap();

        let err = store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::MapIncrement {
                    bin: "data".into(),
                    map_key: StoreValue::Str("f".into()),
                    delta: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ResultCode::ParameterError);
    }

    #[tokio::test]
    async fn test_map_put_unique_counts_new_members_only() {
        let store = MemoryStore::new();
        let k = key("tags");
        let put = |members: Vec<&str>| Operation::MapPutUnique {
            bin: "data".into(),
            members: members
                .into_iter()
                .map(|m| StoreValue::Str(m.into()))
                .collect(),
        };

        let record = store
            .operate(&WritePolicy::default(), &k, put(vec!["a", "b", "c"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(3)));

        let record = store
            .operate(&WritePolicy::default(), &k, put(vec!["b", "d"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(1)));
    }

    #[tokio::test]
    async fn test_map_remove_last_member_deletes_record() {
        let store = MemoryStore::new();
        let k = key("solo");
        let member = StoreValue::Str("only".into());

        store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::MapPutUnique {
                    bin: "data".into(),
                    members: vec![member.clone()],
                },
            )
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        let record = store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::MapRemove {
                    bin: "data".into(),
                    members: vec![member],
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.bin("data"), Some(&StoreValue::Int(1)));
        assert_eq!(store.get(&k).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_op_on_missing_record_fails() {
        let store = MemoryStore::new();
        let err = store
            .operate(
                &WritePolicy::default(),
                &key("nothing"),
                Operation::MapSize { bin: "data".into() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ResultCode::KeyNotFound);
    }

    #[tokio::test]
    async fn test_map_keys_are_ordered() {
        let store = MemoryStore::new();
        let k = key("members");

        store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::MapPutUnique {
                    bin: "data".into(),
                    members: vec![
                        StoreValue::Str("b".into()),
                        StoreValue::Str("a".into()),
                        StoreValue::Str("c".into()),
                    ],
                },
            )
            .await
            .unwrap();

        let record = store
            .operate(
                &WritePolicy::default(),
                &k,
                Operation::MapKeys { bin: "data".into() },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            record.bin("data"),
            Some(&StoreValue::List(vec![
                StoreValue::Str("a".into()),
                StoreValue::Str("b".into()),
                StoreValue::Str("c".into()),
            ]))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    let k = key(&format!("key-{}-{}", i, j));
                    store
                        .put(&WritePolicy::default(), &k, data_bin(StoreValue::Int(j)))
                        .await
                        .unwrap();
                    store.get(&k).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 1000);
    }
}
