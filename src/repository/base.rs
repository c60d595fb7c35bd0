use std::sync::Arc;

use crate::core::{Result, StoreError, Value};
use crate::query::{CompiledQuery, Page, Pageable, QueryOutput, ReturnShape};
use crate::repository::param::{self, Param};
use crate::schema::{Entity, EntitySchema};
use crate::storage::Record;
use crate::template::Template;

/// Base vocabulary over one entity type.
pub(crate) struct BaseOperations<T> {
    template: Template,
    schema: Arc<EntitySchema<T>>,
}

impl<T> Clone for BaseOperations<T> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<T: Entity> BaseOperations<T> {
    pub(crate) fn new(template: Template, schema: Arc<EntitySchema<T>>) -> Self {
        Self { template, schema }
    }

    pub(crate) fn save(&self, entity: Arc<T>) -> Result<Arc<T>> {
        self.template.update(entity)
    }

    pub(crate) fn save_all(&self, entities: Vec<Arc<T>>) -> Result<Vec<Arc<T>>> {
        self.template.update_all(entities)
    }

    pub(crate) fn find_by_id(&self, id: Value) -> Result<Option<Arc<T>>> {
        self.template.find::<T>(required_id(id)?)
    }

    pub(crate) fn exists_by_id(&self, id: Value) -> Result<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    pub(crate) fn find_all(&self) -> Result<Vec<Arc<T>>> {
        self.template.entities::<T>()
    }

    /// Sorted by the pageable's sort keys, then windowed.
    pub(crate) fn find_all_paged(&self, pageable: Pageable) -> Result<Page<T>> {
        let query = CompiledQuery::compile("findAll", ReturnShape::Page, Arc::clone(&self.schema))?;
        query
            .execute(self.template.store(), &[Param::Pageable(pageable)])?
            .into_page()
    }

    /// Unknown ids are skipped.
    pub(crate) fn find_all_by_id(&self, ids: Vec<Value>) -> Result<Vec<Arc<T>>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find_by_id(id)? {
                found.push(entity);
            }
        }
        Ok(found)
    }

    pub(crate) fn count(&self) -> Result<u64> {
        Ok(self.find_all()?.len() as u64)
    }

    pub(crate) fn delete_by_id(&self, id: Value) -> Result<()> {
        self.template.delete(required_id(id)?)
    }

    pub(crate) fn delete(&self, entity: &T) -> Result<()> {
        self.template.delete(self.schema.key(entity)?)
    }

    pub(crate) fn delete_all_by_id(&self, ids: Vec<Value>) -> Result<usize> {
        let ids = ids.into_iter().map(required_id).collect::<Result<Vec<_>>>()?;
        self.template.delete_ids(ids)
    }

    pub(crate) fn delete_all_entities(&self, entities: &[Arc<T>]) -> Result<usize> {
        let ids = entities
            .iter()
            .map(|entity| self.schema.key(entity))
            .collect::<Result<Vec<_>>>()?;
        self.template.delete_ids(ids)
    }

    /// Clears the whole store, entities of other types included.
    pub(crate) fn delete_all(&self) -> Result<()> {
        self.template.delete_all()
    }

    // ========================================================================
    // Dispatch from call arguments
    // ========================================================================

    pub(crate) fn dispatch(&self, method: &str, params: &[Param]) -> Result<QueryOutput<T>> {
        match method {
            "save" => {
                let entity = self.entity_arg(method, params)?;
                Ok(QueryOutput::Single(Some(self.save(entity)?)))
            }
            "saveAll" => Ok(QueryOutput::List(self.save_all(self.entities_arg(method, params)?)?)),
            "findById" => Ok(QueryOutput::Optional(self.find_by_id(first_value(method, params)?)?)),
            "existsById" => Ok(QueryOutput::Boolean(self.exists_by_id(first_value(method, params)?)?)),
            "findAll" => match param::pageable(params) {
                Some(pageable) => Ok(QueryOutput::Page(self.find_all_paged(pageable.clone())?)),
                None => Ok(QueryOutput::List(self.find_all()?)),
            },
            "findAllById" => Ok(QueryOutput::List(self.find_all_by_id(flat_values(params))?)),
            "count" => Ok(QueryOutput::Count(self.count()?)),
            "deleteById" => {
                self.delete_by_id(first_value(method, params)?)?;
                Ok(QueryOutput::Unit)
            }
            "delete" => {
                let entity = self.entity_arg(method, params)?;
                self.delete(&entity)?;
                Ok(QueryOutput::Unit)
            }
            "deleteAll" => {
                if params.iter().any(|p| matches!(p, Param::Entities(_))) {
                    let entities = self.entities_arg(method, params)?;
                    self.delete_all_entities(&entities)?;
                } else {
                    self.delete_all()?;
                }
                Ok(QueryOutput::Unit)
            }
            "deleteAllById" => {
                self.delete_all_by_id(flat_values(params))?;
                Ok(QueryOutput::Unit)
            }
            other => Err(StoreError::Unsupported(format!(
                "'{}' is not part of the repository base vocabulary",
                other
            ))),
        }
    }

    fn entity_arg(&self, method: &str, params: &[Param]) -> Result<Arc<T>> {
        let record = params
            .iter()
            .find_map(|p| match p {
                Param::Entity(record) => Some(record),
                _ => None,
            })
            .ok_or_else(|| StoreError::Argument(format!("{} requires an entity", method)))?;
        self.typed(record)
    }

    fn entities_arg(&self, method: &str, params: &[Param]) -> Result<Vec<Arc<T>>> {
        let records = params
            .iter()
            .find_map(|p| match p {
                Param::Entities(records) => Some(records),
                _ => None,
            })
            .ok_or_else(|| StoreError::Argument(format!("{} requires entities", method)))?;
        records.iter().map(|record| self.typed(record)).collect()
    }

    fn typed(&self, record: &Record) -> Result<Arc<T>> {
        self.schema.downcast(record).ok_or_else(|| {
            StoreError::Mapping(format!(
                "Expected a {} but got a {}",
                self.schema.name(),
                (**record).type_name()
            ))
        })
    }
}

fn required_id(id: Value) -> Result<Value> {
    if id.is_null() {
        return Err(StoreError::argument("Identifier must not be null"));
    }
    Ok(id)
}

fn first_value(method: &str, params: &[Param]) -> Result<Value> {
    param::positional(params)
        .next()
        .cloned()
        .ok_or_else(|| StoreError::Argument(format!("{} requires an identifier", method)))
}

/// Positional values, with list values flattened.
fn flat_values(params: &[Param]) -> Vec<Value> {
    param::positional(params)
        .flat_map(|value| match value {
            Value::List(items) => items.clone(),
            other => vec![other.clone()],
        })
        .collect()
}
