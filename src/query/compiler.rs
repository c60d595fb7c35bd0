use std::sync::Arc;

use tracing::trace;

use crate::core::Result;
use crate::query::condition::Condition;
use crate::query::method::{MethodKind, MethodQuery};
use crate::query::page::Pageable;
use crate::query::predicate::{self, EntityPredicate};
use crate::query::shape::{QueryOutput, ReturnShape};
use crate::query::sort::{self, RecordComparator, Sort};
use crate::repository::param::{self, Param};
use crate::schema::{Entity, EntitySchema};
use crate::storage::ObjectStore;

/// A derived query (or `findAll`) compiled once against an entity schema.
///
/// Field names in the condition and the name-declared sorts are resolved
/// at compile time; operands are bound per call.
pub struct CompiledQuery<T> {
    method: String,
    kind: MethodKind,
    shape: ReturnShape,
    condition: Option<Condition>,
    sorts: Vec<Sort>,
    schema: Arc<EntitySchema<T>>,
}

impl<T: Entity> CompiledQuery<T> {
    pub fn compile(method: &str, shape: ReturnShape, schema: Arc<EntitySchema<T>>) -> Result<Self> {
        let (kind, condition, sorts) = match MethodKind::classify(method, false) {
            MethodKind::FindAll => (MethodKind::FindAll, None, Vec::new()),
            _ => {
                let parsed = MethodQuery::parse(method)?;
                (parsed.kind, Some(parsed.condition.clone()), parsed.sorts.clone())
            }
        };

        if let Some(condition) = &condition {
            check_fields(condition, &schema)?;
        }
        sort::comparators(&schema, &sorts)?;

        Ok(Self {
            method: method.to_string(),
            kind,
            shape,
            condition,
            sorts,
            schema,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    pub fn parameter_count(&self) -> usize {
        self.condition
            .as_ref()
            .map_or(0, Condition::parameter_count)
    }

    /// Binds `params` and runs the pipeline: filter, sort, window, shape.
    pub fn execute(&self, store: &ObjectStore, params: &[Param]) -> Result<QueryOutput<T>> {
        let predicate = self.bind(params)?;
        let filter = predicate::on_records(&predicate);

        if self.kind == MethodKind::DerivedDelete {
            let removed = store.remove_where(&filter)?;
            trace!(method = %self.method, removed, "derived delete");
            return Ok(match self.shape {
                ReturnShape::Count => QueryOutput::Count(removed as u64),
                _ => QueryOutput::Unit,
            });
        }

        let comparators = self.comparators(params)?;
        let pageable = match param::pageable(params) {
            Some(pageable) => Some(pageable.clone()),
            None if self.shape == ReturnShape::Page => {
                Some(Pageable::of_size(store.config().default_page_size)?)
            }
            None => None,
        };
        let (skip, limit) = pageable
            .as_ref()
            .map_or((0, 0), |pageable| (pageable.skip(), pageable.size()));

        let records = store.values_where(&filter, &comparators, skip, limit)?;
        trace!(method = %self.method, returned = records.len(), "derived query");

        Ok(match self.kind {
            MethodKind::DerivedCount => QueryOutput::Count(records.len() as u64),
            MethodKind::DerivedExists => QueryOutput::Boolean(!records.is_empty()),
            _ => {
                let typed = records
                    .iter()
                    .filter_map(|record| self.schema.downcast(record))
                    .collect();
                let pageable = match pageable {
                    Some(pageable) => pageable,
                    None => Pageable::of_size(store.config().default_page_size)?,
                };
                QueryOutput::adapt(self.shape, typed, self.schema.id(), pageable)
            }
        })
    }

    fn bind(&self, params: &[Param]) -> Result<EntityPredicate<T>> {
        match &self.condition {
            Some(condition) => condition.bind(&self.schema, &mut param::positional(params)),
            None => Ok(predicate::always()),
        }
    }

    /// Name-declared sorts first, then sorts from the call arguments.
    fn comparators(&self, params: &[Param]) -> Result<Vec<RecordComparator>> {
        let mut sorts = self.sorts.clone();
        sorts.extend(param::extra_sorts(params));
        if sorts.is_empty() {
            return Ok(Vec::new());
        }
        let chain = sort::comparators(&self.schema, &sorts)?;
        Ok(vec![sort::erase(sort::then_comparing(chain))])
    }
}

fn check_fields<T: Entity>(condition: &Condition, schema: &EntitySchema<T>) -> Result<()> {
    match condition {
        Condition::Compare { field, .. } => schema.resolve(field).map(|_| ()),
        Condition::And(children) | Condition::Or(children) => children
            .iter()
            .try_for_each(|child| check_fields(child, schema)),
        Condition::Not(inner) => check_fields(inner, schema),
    }
}

impl<T> std::fmt::Debug for CompiledQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("method", &self.method)
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .field("condition", &self.condition)
            .field("sorts", &self.sorts)
            .finish()
    }
}
