// ============================================================================
// Sorting: sort requests, typed comparator chains and record sorting
// ============================================================================

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError};
use crate::schema::{Entity, EntityComparator, EntitySchema};
use crate::storage::{Record, downcast_ref};

// ============================================================================
// SORT REQUEST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One sort key: a property name plus a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Desc)
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Asc
    }

    /// Comparator for this key, resolving the property on `schema`.
    pub fn comparator<T: Entity>(&self, schema: &EntitySchema<T>) -> Result<EntityComparator<T>> {
        let field = schema.resolve(&self.property)?;
        Ok(match self.direction {
            Direction::Asc => field.comparator(),
            Direction::Desc => field.reversed(),
        })
    }
}

// ============================================================================
// COMPARATOR CHAINS
// ============================================================================

/// Comparator over type-erased records.
pub type RecordComparator = Box<dyn Fn(&Record, &Record) -> Result<Ordering> + Send + Sync>;

/// Typed comparators for `sorts`, in order; the first is the primary key.
pub fn comparators<T: Entity>(
    schema: &EntitySchema<T>,
    sorts: &[Sort],
) -> Result<Vec<EntityComparator<T>>> {
    sorts.iter().map(|sort| sort.comparator(schema)).collect()
}

/// Chains comparators: later ones only break ties of earlier ones.
pub fn then_comparing<T: 'static>(chain: Vec<EntityComparator<T>>) -> EntityComparator<T> {
    Arc::new(move |a: &T, b: &T| {
        for comparator in &chain {
            let ordering = comparator(a, b)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    })
}

/// Lifts a typed comparator to records of type `T`.
pub fn erase<T: Entity>(comparator: EntityComparator<T>) -> RecordComparator {
    Box::new(move |a: &Record, b: &Record| {
        match (downcast_ref::<T>(a), downcast_ref::<T>(b)) {
            (Some(a), Some(b)) => comparator(a, b),
            _ => Err(StoreError::Mapping(format!(
                "Cannot order records that are not {}",
                T::entity_name()
            ))),
        }
    })
}

// ============================================================================
// SORTING
// ============================================================================

/// Stable in-place sort over a comparator chain.
///
/// The first comparison error aborts the result: the slice order is then
/// unspecified and the error is returned.
pub fn sort_records(records: &mut [Record], sorts: &[RecordComparator]) -> Result<()> {
    if records.len() < 2 || sorts.is_empty() {
        return Ok(());
    }

    let mut failure: Option<StoreError> = None;
    records.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        for comparator in sorts {
            match comparator(a, b) {
                Ok(Ordering::Equal) => continue,
                Ok(ordering) => return ordering,
                Err(err) => {
                    failure = Some(err);
                    return Ordering::Equal;
                }
            }
        }
        Ordering::Equal
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
