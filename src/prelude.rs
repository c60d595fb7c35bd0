//! Recommended API entrypoints grouped by abstraction level.
//!
//! `dx` covers application code: entities, the template and repositories.
//! `advanced` exposes the store, its persister seam and the query internals.

pub mod dx {
    //! Stable high-level surface.
    pub use crate::{
        Entities, Entity, MethodSignature, Page, Pageable, Param, QueryOutput, Repository,
        RepositoryDescriptor, Result, ReturnShape, Sort, StoreError, Template, Value,
    };
}

pub mod advanced {
    //! Escape hatch for store and query internals.
    pub use crate::config::{CommitPolicy, StoreConfig};
    pub use crate::query::{
        CompiledQuery, Condition, Conjunction, MethodKind, MethodQuery, Operand, Operator,
    };
    pub use crate::schema::{Attribute, AttributeKind, EntitySchema, FieldAccessor};
    pub use crate::storage::{
        CommitEvent, CommitLog, Entries, NoopPersister, ObjectStore, Persistable, Persister,
        Record, StoredObject,
    };
}
