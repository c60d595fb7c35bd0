pub mod object_store;
pub mod persister;
pub mod record;
pub mod transaction;

use crate::core::Value;

pub use object_store::{ObjectStore, RecordFilter};
pub use persister::{CommitEvent, CommitLog, NoopPersister, Persistable, Persister};
pub use record::{
    Record, StoredObject, downcast, downcast_ref, is_instance_of, record, record_from_arc,
    same_instance,
};

/// Persistent map backing the store; clones are O(1) snapshots.
pub type Entries = im::HashMap<Value, Record>;
