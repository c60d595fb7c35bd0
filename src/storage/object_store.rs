use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};

use tracing::trace;

use crate::config::{CommitPolicy, StoreConfig};
use crate::core::{Result, StoreError, Value};
use crate::query::sort::{RecordComparator, sort_records};
use crate::storage::persister::{NoopPersister, Persistable, Persister};
use crate::storage::{Entries, Record, same_instance};

/// Filter over type-erased records.
pub type RecordFilter<'a> = &'a dyn Fn(&Record) -> Result<bool>;

/// Map-like id -> record container with a write-through commit policy.
///
/// Writers are serialised by the container lock and commit while holding
/// it, so the persister sees commits in mutation order. Readers work on an
/// O(1) snapshot of the map and never observe a half-applied batch.
pub struct ObjectStore {
    entries: RwLock<Entries>,
    persister: Arc<dyn Persister>,
    config: StoreConfig,
    pub(crate) transaction_lock: Mutex<()>,
}

impl ObjectStore {
    pub fn new(persister: Arc<dyn Persister>) -> Self {
        Self::with_config(persister, StoreConfig::default())
    }

    pub fn with_config(persister: Arc<dyn Persister>, config: StoreConfig) -> Self {
        Self::hydrate(persister, config, Entries::new())
    }

    /// Store without a durable collaborator.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(NoopPersister))
    }

    /// Store hydrated from previously persisted entries. Nothing is committed.
    pub fn hydrate(persister: Arc<dyn Persister>, config: StoreConfig, entries: Entries) -> Self {
        Self {
            entries: RwLock::new(entries),
            persister,
            config,
            transaction_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Upsert `record` under `key`, returning the replaced record.
    ///
    /// Re-putting the instance already held under `key` commits only that
    /// record; a new key or a different instance commits the container.
    pub fn put(&self, key: impl Into<Value>, record: Record) -> Result<Option<Record>> {
        let key = non_null_key(key.into())?;
        let mut entries = self.entries.write()?;
        let previous = entries.insert(key.clone(), Arc::clone(&record));
        let in_place = previous
            .as_ref()
            .is_some_and(|old| same_instance(old, &record));

        if in_place && self.config.commit_policy == CommitPolicy::Refined {
            trace!(key = %key, "commit record");
            self.persister.store(Persistable::Record { key, record });
        } else {
            self.commit_container(&entries);
        }
        Ok(previous)
    }

    /// Upsert a batch, committing the container at most once and the
    /// in-place records at most once.
    pub fn put_all(&self, batch: Vec<(Value, Record)>) -> Result<()> {
        if let Some((key, _)) = batch.iter().find(|(key, _)| key.is_null()) {
            return Err(StoreError::Argument(format!("Null key in batch ({})", key)));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let mut entries = self.entries.write()?;
        let mut structural = false;
        let mut in_place = Vec::new();

        for (key, record) in batch {
            match entries.insert(key.clone(), Arc::clone(&record)) {
                Some(old) if same_instance(&old, &record) => {
                    in_place.push(Persistable::Record { key, record });
                }
                _ => structural = true,
            }
        }

        let refined = self.config.commit_policy == CommitPolicy::Refined;
        if structural || (!refined && !in_place.is_empty()) {
            self.commit_container(&entries);
        }
        if refined && !in_place.is_empty() {
            trace!(records = in_place.len(), "commit record batch");
            self.persister.store_all(in_place);
        }
        Ok(())
    }

    pub fn remove(&self, key: &Value) -> Result<Option<Record>> {
        let key = non_null_key(key.clone())?;
        let mut entries = self.entries.write()?;
        let removed = entries.remove(&key);
        self.commit_container(&entries);
        Ok(removed)
    }

    /// Remove every listed key, committing the container once.
    pub fn remove_all(&self, keys: impl IntoIterator<Item = Value>) -> Result<usize> {
        let keys: Vec<Value> = keys.into_iter().collect();
        if keys.iter().any(Value::is_null) {
            return Err(StoreError::argument("Null key in removal list"));
        }
        let mut entries = self.entries.write()?;
        Ok(self.remove_keys(&mut entries, &keys))
    }

    /// Remove every record matching `filter`, committing the container once.
    pub fn remove_where(&self, filter: RecordFilter<'_>) -> Result<usize> {
        let mut entries = self.entries.write()?;
        let mut keys = Vec::new();
        for (key, record) in entries.iter() {
            if filter(record)? {
                keys.push(key.clone());
            }
        }
        Ok(self.remove_keys(&mut entries, &keys))
    }

    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write()?;
        entries.clear();
        self.commit_container(&entries);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, key: &Value) -> Result<Option<Record>> {
        Ok(self.entries.read()?.get(key).cloned())
    }

    pub fn contains_key(&self, key: &Value) -> Result<bool> {
        Ok(self.entries.read()?.contains_key(key))
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries.read()?.is_empty())
    }

    /// O(1) copy of the current container.
    pub fn snapshot(&self) -> Result<Entries> {
        Ok(self.entries.read()?.clone())
    }

    pub fn values(&self) -> Result<Vec<Record>> {
        Ok(self.snapshot()?.values().cloned().collect())
    }

    /// Filter, sort, then skip and limit. Zero skip or limit means none.
    pub fn values_where(
        &self,
        filter: RecordFilter<'_>,
        sorts: &[RecordComparator],
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let snapshot = self.snapshot()?;
        let mut matched = Vec::new();
        for record in snapshot.values() {
            if filter(record)? {
                matched.push(Arc::clone(record));
            }
        }
        sort_records(&mut matched, sorts)?;

        let total = matched.len();
        let window: Vec<Record> = match limit {
            0 => matched.into_iter().skip(skip).collect(),
            n => matched.into_iter().skip(skip).take(n).collect(),
        };
        trace!(matched = total, returned = window.len(), skip, limit, "scan");
        Ok(window)
    }

    // ========================================================================
    // Commits
    // ========================================================================

    fn remove_keys(&self, entries: &mut RwLockWriteGuard<'_, Entries>, keys: &[Value]) -> usize {
        let removed = keys
            .iter()
            .filter(|key| entries.remove(*key).is_some())
            .count();
        self.commit_container(entries);
        removed
    }

    fn commit_container(&self, entries: &Entries) {
        trace!(len = entries.len(), "commit container");
        self.persister.store(Persistable::Container(entries.clone()));
    }

    pub(crate) fn commit_root(&self) -> Result<()> {
        let entries = self.entries.read()?;
        self.commit_container(&entries);
        Ok(())
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("config", &self.config)
            .field("size", &self.size().ok())
            .finish()
    }
}

fn non_null_key(key: Value) -> Result<Value> {
    if key.is_null() {
        return Err(StoreError::argument("Key must not be null"));
    }
    Ok(key)
}
