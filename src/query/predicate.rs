use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError, Value};
use crate::schema::{Entity, FieldAccessor};
use crate::storage::{Record, downcast_ref};

/// Fallible test over an entity instance.
pub type EntityPredicate<T> = Arc<dyn Fn(&T) -> Result<bool> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    fn admits(self, ordering: Ordering) -> bool {
        match self {
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            Operator::Eq => ordering == Ordering::Equal,
            Operator::In => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
        };
        f.write_str(symbol)
    }
}

/// Builds `field <operator> operand` over instances of `T`.
///
/// Range operators ask whether the record's value lies beyond the bound:
/// `Gt` matches when `operand < value`. They require operand and value to
/// be the same variant and fail with a type mismatch otherwise; a NULL
/// field value never matches a range. `In` needs a list operand.
pub fn build<T: Entity>(
    operator: Operator,
    operand: Value,
    field: &FieldAccessor<T>,
) -> Result<EntityPredicate<T>> {
    if operand.is_null() {
        return Err(StoreError::Argument(format!(
            "Null operand for '{}' on field '{}'",
            operator,
            field.name()
        )));
    }

    let field = field.clone();
    match operator {
        Operator::Eq => Ok(Arc::new(move |instance: &T| Ok(field.get(instance) == operand))),
        Operator::In => {
            let members = match operand {
                Value::List(items) => items,
                other => {
                    return Err(StoreError::Mapping(format!(
                        "IN on field '{}' requires a list operand, got {}",
                        field.name(),
                        other.type_name()
                    )));
                }
            };
            Ok(Arc::new(move |instance: &T| {
                let value = field.get(instance);
                Ok(members.contains(&value))
            }))
        }
        range => Ok(Arc::new(move |instance: &T| {
            let value = field.get(instance);
            if value.is_null() {
                return Ok(false);
            }
            if !value.same_type(&operand) {
                return Err(StoreError::TypeMismatch(format!(
                    "Field '{}' holds {} but the {} operand is {}",
                    field.name(),
                    value.type_name(),
                    range,
                    operand.type_name()
                )));
            }
            Ok(range.admits(value.compare(&operand)?))
        })),
    }
}

pub fn and<T: 'static>(left: EntityPredicate<T>, right: EntityPredicate<T>) -> EntityPredicate<T> {
    Arc::new(move |instance: &T| Ok(left(instance)? && right(instance)?))
}

pub fn or<T: 'static>(left: EntityPredicate<T>, right: EntityPredicate<T>) -> EntityPredicate<T> {
    Arc::new(move |instance: &T| Ok(left(instance)? || right(instance)?))
}

pub fn not<T: 'static>(inner: EntityPredicate<T>) -> EntityPredicate<T> {
    Arc::new(move |instance: &T| Ok(!inner(instance)?))
}

pub fn always<T: 'static>() -> EntityPredicate<T> {
    Arc::new(|_: &T| Ok(true))
}

/// Lifts a typed predicate to records: records of other types never match.
pub fn on_records<T: Entity>(predicate: &EntityPredicate<T>) -> impl Fn(&Record) -> Result<bool> + '_ {
    move |record: &Record| match downcast_ref::<T>(record) {
        Some(instance) => predicate(instance),
        None => Ok(false),
    }
}
