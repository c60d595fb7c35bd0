// ============================================================================
// memrepo: in-process object store with derived queries
// ============================================================================

extern crate self as memrepo;

pub mod config;
pub mod core;
pub mod prelude;
pub mod query;
pub mod repository;
pub mod schema;
pub mod storage;
pub mod template;

// Re-export main types for convenience
pub use config::{CommitPolicy, StoreConfig};
pub use core::{Result, StoreError, Value};
pub use query::{
    Condition, DeleteQuery, Direction, Page, Pageable, QueryOutput, ReturnShape, SelectQuery, Sort,
};
pub use repository::{MethodSignature, Param, Repository, RepositoryDescriptor};
pub use schema::{Attribute, AttributeKind, Entities, Entity, EntitySchema, FieldAccessor};
pub use storage::{
    CommitEvent, CommitLog, NoopPersister, ObjectStore, Persistable, Persister, Record,
};
pub use template::Template;

/// `#[derive(Entity)]`: `#[id]` marks the identifier, `#[column]` the
/// stored fields, `#[entity(name = "...")]` overrides the entity name.
pub use memrepo_derive::Entity;
