use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::core::{Result, StoreError, Value};
use crate::query::page::{Page, Pageable};
use crate::schema::FieldAccessor;

/// Shape a query result is adapted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// Lazy iterator over the result snapshot.
    Stream,
    List,
    /// Unique by identifier.
    Set,
    Deque,
    Page,
    Optional,
    Boolean,
    Count,
    /// Fallback: first element or nothing.
    Single,
}

impl ReturnShape {
    /// Resolves a declared return type name, e.g. `List<Book>`,
    /// `std::collections::VecDeque<Book>` or `Option<Book>`.
    pub fn of(declared: &str) -> Self {
        let base = declared.split('<').next().unwrap_or(declared).trim();
        let base = base.rsplit("::").next().unwrap_or(base).trim();
        match base.to_ascii_lowercase().as_str() {
            "stream" | "iterator" => Self::Stream,
            "list" | "iterable" | "collection" | "vec" => Self::List,
            "set" | "hashset" | "btreeset" | "sortedset" => Self::Set,
            "deque" | "queue" | "vecdeque" => Self::Deque,
            "page" => Self::Page,
            "optional" | "option" => Self::Optional,
            "bool" | "boolean" => Self::Boolean,
            "long" | "u64" | "usize" | "count" => Self::Count,
            _ => Self::Single,
        }
    }
}

/// Result of a repository call or a compiled query.
pub enum QueryOutput<T> {
    Stream(Box<dyn Iterator<Item = Arc<T>> + Send>),
    List(Vec<Arc<T>>),
    Set(HashMap<Value, Arc<T>>),
    Deque(VecDeque<Arc<T>>),
    Page(Page<T>),
    Optional(Option<Arc<T>>),
    Single(Option<Arc<T>>),
    Boolean(bool),
    Count(u64),
    Unit,
}

impl<T: Send + Sync + 'static> QueryOutput<T> {
    /// Adapts an ordered result into `shape`.
    pub fn adapt(
        shape: ReturnShape,
        records: Vec<Arc<T>>,
        id: &FieldAccessor<T>,
        pageable: Pageable,
    ) -> Self {
        match shape {
            ReturnShape::Stream => Self::Stream(Box::new(records.into_iter())),
            ReturnShape::List => Self::List(records),
            ReturnShape::Set => Self::Set(
                records
                    .into_iter()
                    .map(|record| (id.get(&record), record))
                    .collect(),
            ),
            ReturnShape::Deque => Self::Deque(records.into()),
            ReturnShape::Page => Self::Page(Page::new(records, pageable)),
            ReturnShape::Optional => Self::Optional(records.into_iter().next()),
            ReturnShape::Boolean => Self::Boolean(!records.is_empty()),
            ReturnShape::Count => Self::Count(records.len() as u64),
            ReturnShape::Single => Self::Single(records.into_iter().next()),
        }
    }
}

impl<T> QueryOutput<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stream(_) => "stream",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Deque(_) => "deque",
            Self::Page(_) => "page",
            Self::Optional(_) => "optional",
            Self::Single(_) => "single",
            Self::Boolean(_) => "boolean",
            Self::Count(_) => "count",
            Self::Unit => "unit",
        }
    }

    fn mismatch(&self, expected: &str) -> StoreError {
        StoreError::TypeMismatch(format!(
            "Expected a {} result, got {}",
            expected,
            self.kind()
        ))
    }

    /// Any collection-like result as a list. Set order is unspecified.
    pub fn into_list(self) -> Result<Vec<Arc<T>>> {
        match self {
            Self::List(items) => Ok(items),
            Self::Stream(iter) => Ok(iter.collect()),
            Self::Deque(items) => Ok(items.into()),
            Self::Page(page) => Ok(page.into_content()),
            Self::Set(items) => Ok(items.into_values().collect()),
            other => Err(other.mismatch("collection")),
        }
    }

    pub fn into_set(self) -> Result<HashMap<Value, Arc<T>>> {
        match self {
            Self::Set(items) => Ok(items),
            other => Err(other.mismatch("set")),
        }
    }

    pub fn into_deque(self) -> Result<VecDeque<Arc<T>>> {
        match self {
            Self::Deque(items) => Ok(items),
            other => Err(other.mismatch("deque")),
        }
    }

    pub fn into_stream(self) -> Result<Box<dyn Iterator<Item = Arc<T>> + Send>> {
        match self {
            Self::Stream(iter) => Ok(iter),
            other => Err(other.mismatch("stream")),
        }
    }

    pub fn into_page(self) -> Result<Page<T>> {
        match self {
            Self::Page(page) => Ok(page),
            other => Err(other.mismatch("page")),
        }
    }

    /// First-or-empty for both the optional and the fallback shape.
    pub fn into_optional(self) -> Result<Option<Arc<T>>> {
        match self {
            Self::Optional(item) | Self::Single(item) => Ok(item),
            other => Err(other.mismatch("optional")),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Boolean(flag) => Ok(flag),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Self::Count(count) => Ok(count),
            other => Err(other.mismatch("count")),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Self::Deque(items) => f.debug_tuple("Deque").field(items).finish(),
            Self::Page(page) => f.debug_tuple("Page").field(page).finish(),
            Self::Optional(item) => f.debug_tuple("Optional").field(item).finish(),
            Self::Single(item) => f.debug_tuple("Single").field(item).finish(),
            Self::Boolean(flag) => f.debug_tuple("Boolean").field(flag).finish(),
            Self::Count(count) => f.debug_tuple("Count").field(count).finish(),
            Self::Unit => f.write_str("Unit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_table() {
        assert_eq!(ReturnShape::of("Stream<Book>"), ReturnShape::Stream);
        assert_eq!(ReturnShape::of("List<Book>"), ReturnShape::List);
        assert_eq!(ReturnShape::of("Vec<Book>"), ReturnShape::List);
        assert_eq!(ReturnShape::of("Iterable<Book>"), ReturnShape::List);
        assert_eq!(ReturnShape::of("HashSet<Book>"), ReturnShape::Set);
        assert_eq!(ReturnShape::of("std::collections::VecDeque<Book>"), ReturnShape::Deque);
        assert_eq!(ReturnShape::of("Queue<Book>"), ReturnShape::Deque);
        assert_eq!(ReturnShape::of("Page<Book>"), ReturnShape::Page);
        assert_eq!(ReturnShape::of("Option<Book>"), ReturnShape::Optional);
        assert_eq!(ReturnShape::of("boolean"), ReturnShape::Boolean);
        assert_eq!(ReturnShape::of("long"), ReturnShape::Count);
        assert_eq!(ReturnShape::of("Book"), ReturnShape::Single);
    }

    #[test]
    fn test_conversion_rejects_wrong_kind() {
        let out: QueryOutput<i64> = QueryOutput::Count(3);
        assert!(matches!(out.into_list(), Err(StoreError::TypeMismatch(_))));

        let out: QueryOutput<i64> = QueryOutput::Deque(VecDeque::from(vec![Arc::new(1)]));
        assert_eq!(out.into_list().unwrap().len(), 1);
    }
}
