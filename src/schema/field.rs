use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::core::{Result, StoreError, Value};
use crate::storage::{Record, downcast_ref};

pub type Reader<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Total order over instances of `T`, fallible when values of different
/// types meet.
pub type EntityComparator<T> = Arc<dyn Fn(&T, &T) -> Result<Ordering> + Send + Sync>;

/// Reads one named attribute off an entity instance.
pub struct FieldAccessor<T> {
    name: String,
    entity: &'static str,
    read: Reader<T>,
}

impl<T: 'static> FieldAccessor<T> {
    pub fn new(name: impl Into<String>, entity: &'static str, read: Reader<T>) -> Self {
        Self {
            name: name.into(),
            entity,
            read,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn get(&self, instance: &T) -> Value {
        (self.read)(instance)
    }

    /// Reads the attribute off a type-erased record.
    pub fn get_record(&self, record: &Record) -> Result<Value> {
        let instance = downcast_ref::<T>(record).ok_or_else(|| {
            StoreError::Mapping(format!(
                "Cannot read field '{}' of {} from a {}",
                self.name,
                self.entity,
                (**record).type_name()
            ))
        })?;
        Ok(self.get(instance))
    }

    /// Ascending order on this field, NULL last.
    pub fn comparator(&self) -> EntityComparator<T> {
        let read = Arc::clone(&self.read);
        Arc::new(move |a: &T, b: &T| read(a).compare(&read(b)))
    }

    /// Descending order on this field, NULL first.
    pub fn reversed(&self) -> EntityComparator<T> {
        let read = Arc::clone(&self.read);
        Arc::new(move |a: &T, b: &T| Ok(read(a).compare(&read(b))?.reverse()))
    }
}

impl<T> Clone for FieldAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entity: self.entity,
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> PartialEq for FieldAccessor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.entity == other.entity
    }
}

impl<T> Eq for FieldAccessor<T> {}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("entity", &self.entity)
            .field("name", &self.name)
            .finish()
    }
}
