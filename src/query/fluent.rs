use std::sync::Arc;

use tracing::trace;

use crate::core::{Result, StoreError, Value};
use crate::query::condition::{Condition, Conjunction, Operand};
use crate::query::predicate::{self, EntityPredicate, Operator};
use crate::query::sort::{self, Direction, RecordComparator, Sort};
use crate::schema::{Entity, EntitySchema};
use crate::storage::ObjectStore;

// ============================================================================
// CONDITION ACCUMULATOR
// ============================================================================

/// Pending field, conjunction and negation plus the tree built so far.
struct ConditionAccumulator<T> {
    schema: Arc<EntitySchema<T>>,
    condition: Option<Condition>,
    field: Option<String>,
    conjunction: Conjunction,
    negate: bool,
}

impl<T: Entity> ConditionAccumulator<T> {
    fn new(schema: Arc<EntitySchema<T>>) -> Self {
        Self {
            schema,
            condition: None,
            field: None,
            conjunction: Conjunction::And,
            negate: false,
        }
    }

    fn target(&mut self, field: &str, conjunction: Conjunction) {
        self.field = Some(field.to_string());
        self.conjunction = conjunction;
    }

    /// Appends `field <operator> operand`; negation applies to this leaf only.
    fn push(&mut self, operator: Operator, operand: Value) -> Result<()> {
        let field = self.field.as_deref().ok_or_else(|| {
            StoreError::mapping("No field selected: call where_, and or or before a comparison")
        })?;
        let accessor = self.schema.resolve(field)?;
        predicate::build(operator, operand.clone(), accessor)?;

        let mut leaf = Condition::compare(accessor.name(), operator, Operand::Literal(operand));
        if self.negate {
            leaf = leaf.negate();
            self.negate = false;
        }
        self.condition = Some(match self.condition.take() {
            None => leaf,
            Some(current) => current.combine(self.conjunction, leaf),
        });
        Ok(())
    }

    fn predicate(&self) -> Result<EntityPredicate<T>> {
        match &self.condition {
            Some(condition) => condition.bind(&self.schema, &mut std::iter::empty::<&Value>()),
            None => Ok(predicate::always()),
        }
    }
}

macro_rules! condition_methods {
    () => {
        /// Selects the field the next comparison applies to, joined with AND.
        pub fn where_(mut self, field: &str) -> Self {
            self.conditions.target(field, Conjunction::And);
            self
        }

        pub fn and(mut self, field: &str) -> Self {
            self.conditions.target(field, Conjunction::And);
            self
        }

        pub fn or(mut self, field: &str) -> Self {
            self.conditions.target(field, Conjunction::Or);
            self
        }

        /// Negates the next comparison only.
        pub fn not(mut self) -> Self {
            self.conditions.negate = true;
            self
        }

        pub fn eq(mut self, value: impl Into<Value>) -> Result<Self> {
            self.conditions.push(Operator::Eq, value.into())?;
            Ok(self)
        }

        pub fn gt(mut self, value: impl Into<Value>) -> Result<Self> {
            self.conditions.push(Operator::Gt, value.into())?;
            Ok(self)
        }

        pub fn gte(mut self, value: impl Into<Value>) -> Result<Self> {
            self.conditions.push(Operator::Gte, value.into())?;
            Ok(self)
        }

        pub fn lt(mut self, value: impl Into<Value>) -> Result<Self> {
            self.conditions.push(Operator::Lt, value.into())?;
            Ok(self)
        }

        pub fn lte(mut self, value: impl Into<Value>) -> Result<Self> {
            self.conditions.push(Operator::Lte, value.into())?;
            Ok(self)
        }

        pub fn in_<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Result<Self> {
            let values = Value::List(values.into_iter().map(Into::into).collect());
            self.conditions.push(Operator::In, values)?;
            Ok(self)
        }

        /// Always fails: range queries are not supported.
        pub fn between(self, _low: impl Into<Value>, _high: impl Into<Value>) -> Result<Self> {
            Err(StoreError::unsupported("between is not supported"))
        }

        /// Always fails: pattern queries are not supported.
        pub fn like(self, _pattern: impl Into<Value>) -> Result<Self> {
            Err(StoreError::unsupported("like is not supported"))
        }

        /// Condition tree built so far.
        pub fn condition(&self) -> Option<&Condition> {
            self.conditions.condition.as_ref()
        }
    };
}

// ============================================================================
// SELECT
// ============================================================================

/// Programmatic query over entities of type `T`.
///
/// ```
/// # use std::sync::Arc;
/// # use memrepo::{Entity, Entities, ObjectStore, Template};
/// #[derive(Debug, Entity)]
/// struct Book {
///     #[id]
///     isbn: String,
///     #[column]
///     edition: i32,
/// }
///
/// # fn main() -> memrepo::Result<()> {
/// let template = Template::new(
///     Arc::new(ObjectStore::in_memory()),
///     Entities::new().with::<Book>()?,
/// );
/// template.insert(Book { isbn: "11".into(), edition: 3 })?;
///
/// let books = template
///     .select::<Book>()?
///     .where_("edition")
///     .not()
///     .lte(2)?
///     .result()?;
/// assert_eq!(books.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SelectQuery<'a, T> {
    store: &'a ObjectStore,
    conditions: ConditionAccumulator<T>,
    sorts: Vec<Sort>,
    skip: usize,
    limit: usize,
}

impl<'a, T: Entity> SelectQuery<'a, T> {
    pub fn new(store: &'a ObjectStore, schema: Arc<EntitySchema<T>>) -> Self {
        Self {
            store,
            conditions: ConditionAccumulator::new(schema),
            sorts: Vec::new(),
            skip: 0,
            limit: 0,
        }
    }

    condition_methods!();

    /// Starts a sort key on `field`; finish it with `asc()` or `desc()`.
    pub fn order_by(self, field: &str) -> OrderBy<'a, T> {
        OrderBy {
            query: self,
            property: field.to_string(),
        }
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Zero means unlimited.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Lazily walks a fresh snapshot of the matches. Call again to restart.
    pub fn stream(&self) -> Result<Box<dyn Iterator<Item = Arc<T>> + Send>> {
        Ok(Box::new(self.result()?.into_iter()))
    }

    pub fn result(&self) -> Result<Vec<Arc<T>>> {
        let predicate = self.conditions.predicate()?;
        let filter = predicate::on_records(&predicate);
        let records = self
            .store
            .values_where(&filter, &self.comparators()?, self.skip, self.limit)?;
        trace!(
            entity = T::entity_name(),
            returned = records.len(),
            "fluent select"
        );
        let schema = &self.conditions.schema;
        Ok(records
            .iter()
            .filter_map(|record| schema.downcast(record))
            .collect())
    }

    /// The only match, or nothing. More than one match is an error.
    pub fn single_result(&self) -> Result<Option<Arc<T>>> {
        let mut matches = self.result()?;
        if matches.len() > 1 {
            return Err(StoreError::NonUniqueResult(format!(
                "Expected at most one {}, found {}",
                T::entity_name(),
                matches.len()
            )));
        }
        Ok(matches.pop())
    }

    fn comparators(&self) -> Result<Vec<RecordComparator>> {
        if self.sorts.is_empty() {
            return Ok(Vec::new());
        }
        let chain = sort::comparators(&self.conditions.schema, &self.sorts)?;
        Ok(vec![sort::erase(sort::then_comparing(chain))])
    }
}

/// Pending sort key of a [`SelectQuery`].
pub struct OrderBy<'a, T> {
    query: SelectQuery<'a, T>,
    property: String,
}

impl<'a, T: Entity> OrderBy<'a, T> {
    pub fn asc(self) -> Result<SelectQuery<'a, T>> {
        self.finish(Direction::Asc)
    }

    pub fn desc(self) -> Result<SelectQuery<'a, T>> {
        self.finish(Direction::Desc)
    }

    fn finish(self, direction: Direction) -> Result<SelectQuery<'a, T>> {
        let mut query = self.query;
        let field = query.conditions.schema.resolve(&self.property)?;
        query.sorts.push(Sort::new(field.name(), direction));
        Ok(query)
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// Programmatic removal of entities of type `T`.
pub struct DeleteQuery<'a, T> {
    store: &'a ObjectStore,
    conditions: ConditionAccumulator<T>,
}

impl<'a, T: Entity> DeleteQuery<'a, T> {
    pub fn new(store: &'a ObjectStore, schema: Arc<EntitySchema<T>>) -> Self {
        Self {
            store,
            conditions: ConditionAccumulator::new(schema),
        }
    }

    condition_methods!();

    /// Removes every match, committing the container once. Returns the
    /// number of removed entities.
    pub fn execute(&self) -> Result<usize> {
        let predicate = self.conditions.predicate()?;
        let filter = predicate::on_records(&predicate);
        let removed = self.store.remove_where(&filter)?;
        trace!(entity = T::entity_name(), removed, "fluent delete");
        Ok(removed)
    }
}
