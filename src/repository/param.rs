use std::sync::Arc;

use crate::core::Value;
use crate::query::{Pageable, Sort};
use crate::storage::{Record, StoredObject, record_from_arc};

/// One call argument of a repository method.
///
/// Only `Value` arguments are positional; pageables and sorts are picked
/// out wherever they appear.
#[derive(Debug, Clone)]
pub enum Param {
    Value(Value),
    Pageable(Pageable),
    Sort(Sort),
    Entity(Record),
    Entities(Vec<Record>),
}

impl Param {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn entity<T: StoredObject>(entity: Arc<T>) -> Self {
        Self::Entity(record_from_arc(entity))
    }

    pub fn entities<T: StoredObject>(entities: impl IntoIterator<Item = Arc<T>>) -> Self {
        Self::Entities(entities.into_iter().map(record_from_arc).collect())
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Pageable> for Param {
    fn from(pageable: Pageable) -> Self {
        Self::Pageable(pageable)
    }
}

impl From<Sort> for Param {
    fn from(sort: Sort) -> Self {
        Self::Sort(sort)
    }
}

/// Positional values, in call order.
pub fn positional(params: &[Param]) -> impl Iterator<Item = &Value> {
    params.iter().filter_map(|param| match param {
        Param::Value(value) => Some(value),
        _ => None,
    })
}

/// First pageable argument, if any.
pub fn pageable(params: &[Param]) -> Option<&Pageable> {
    params.iter().find_map(|param| match param {
        Param::Pageable(pageable) => Some(pageable),
        _ => None,
    })
}

/// Sort keys carried by `Sort` and `Pageable` arguments, in call order.
pub fn extra_sorts(params: &[Param]) -> Vec<Sort> {
    params
        .iter()
        .flat_map(|param| match param {
            Param::Sort(sort) => vec![sort.clone()],
            Param::Pageable(pageable) => pageable.sorts().to_vec(),
            _ => Vec::new(),
        })
        .collect()
}
