use std::sync::Arc;
use std::time::Duration;

use crate::core::{Result, StoreError, Value};
use crate::query::{DeleteQuery, SelectQuery};
use crate::schema::{Entities, Entity, EntitySchema};
use crate::storage::{ObjectStore, Record, downcast};

/// Programmatic API over an object store and its registered entity types.
///
/// One store may hold several entity types. Typed reads only see entities
/// of the requested type; a write under a key held by another type
/// replaces that entry.
#[derive(Clone)]
pub struct Template {
    store: Arc<ObjectStore>,
    entities: Arc<Entities>,
}

impl Template {
    pub fn new(store: Arc<ObjectStore>, entities: Entities) -> Self {
        Self {
            store,
            entities: Arc::new(entities),
        }
    }

    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    pub fn registry(&self) -> &Entities {
        &self.entities
    }

    pub fn schema<T: Entity>(&self) -> Result<Arc<EntitySchema<T>>> {
        self.entities.metadata::<T>()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub fn insert<T: Entity>(&self, entity: T) -> Result<Arc<T>> {
        self.update(Arc::new(entity))
    }

    pub fn insert_all<T: Entity>(&self, entities: impl IntoIterator<Item = T>) -> Result<Vec<Arc<T>>> {
        self.update_all(entities.into_iter().map(Arc::new))
    }

    /// Upserts a shared instance. Re-storing the instance already held
    /// under its key commits only that record.
    pub fn update<T: Entity>(&self, entity: Arc<T>) -> Result<Arc<T>> {
        let (key, record) = self.schema::<T>()?.entry(Arc::clone(&entity))?;
        self.store.put(key, record)?;
        Ok(entity)
    }

    pub fn update_all<T: Entity>(
        &self,
        entities: impl IntoIterator<Item = Arc<T>>,
    ) -> Result<Vec<Arc<T>>> {
        let schema = self.schema::<T>()?;
        let entities: Vec<Arc<T>> = entities.into_iter().collect();
        let batch = entities
            .iter()
            .map(|entity| schema.entry(Arc::clone(entity)))
            .collect::<Result<Vec<(Value, Record)>>>()?;
        self.store.put_all(batch)?;
        Ok(entities)
    }

    /// Time-to-live is not modelled; always fails.
    pub fn insert_with_ttl<T: Entity>(&self, _entity: T, _ttl: Duration) -> Result<Arc<T>> {
        Err(StoreError::unsupported("insert with time-to-live"))
    }

    /// Time-to-live is not modelled; always fails.
    pub fn insert_all_with_ttl<T: Entity>(
        &self,
        _entities: impl IntoIterator<Item = T>,
        _ttl: Duration,
    ) -> Result<Vec<Arc<T>>> {
        Err(StoreError::unsupported("insert with time-to-live"))
    }

    /// Removes whatever is stored under `id`, whatever its type.
    pub fn delete(&self, id: impl Into<Value>) -> Result<()> {
        self.store.remove(&id.into())?;
        Ok(())
    }

    pub fn delete_ids(&self, ids: impl IntoIterator<Item = Value>) -> Result<usize> {
        self.store.remove_all(ids)
    }

    pub fn delete_all(&self) -> Result<()> {
        self.store.clear()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn find<T: Entity>(&self, id: impl Into<Value>) -> Result<Option<Arc<T>>> {
        self.schema::<T>()?;
        Ok(self
            .store
            .get(&id.into())?
            .and_then(|record| downcast::<T>(&record)))
    }

    pub fn entities<T: Entity>(&self) -> Result<Vec<Arc<T>>> {
        let schema = self.schema::<T>()?;
        Ok(self
            .store
            .values()?
            .iter()
            .filter_map(|record| schema.downcast(record))
            .collect())
    }

    pub fn size(&self) -> Result<usize> {
        self.store.size()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    pub fn select<T: Entity>(&self) -> Result<SelectQuery<'_, T>> {
        Ok(SelectQuery::new(&self.store, self.schema::<T>()?))
    }

    pub fn delete_from<T: Entity>(&self) -> Result<DeleteQuery<'_, T>> {
        Ok(DeleteQuery::new(&self.store, self.schema::<T>()?))
    }

    /// See [`ObjectStore::transaction`].
    pub fn transaction<R>(&self, work: impl FnOnce() -> Result<R>) -> Result<R> {
        self.store.transaction(work)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("store", &self.store)
            .field("entities", &self.entities)
            .finish()
    }
}
