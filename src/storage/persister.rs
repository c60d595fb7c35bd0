use std::sync::{Mutex, PoisonError};

use crate::core::Value;
use crate::storage::{Entries, Record};

/// Unit of work handed to the durable collaborator.
#[derive(Debug, Clone)]
pub enum Persistable {
    /// The whole id -> record container (structural change).
    Container(Entries),
    /// A single record whose slot was reused in place.
    Record { key: Value, record: Record },
}

impl Persistable {
    pub fn key(&self) -> Option<&Value> {
        match self {
            Self::Container(_) => None,
            Self::Record { key, .. } => Some(key),
        }
    }
}

/// Durable storage collaborator.
///
/// Both calls are fire-and-forget from the store's point of view; a
/// persister that can fail is expected to handle that on its own side.
pub trait Persister: Send + Sync {
    fn store(&self, object: Persistable);

    fn store_all(&self, objects: Vec<Persistable>);
}

/// Persister that drops every commit.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPersister;

impl Persister for NoopPersister {
    fn store(&self, _object: Persistable) {}

    fn store_all(&self, _objects: Vec<Persistable>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitEvent {
    Container { len: usize },
    Record { key: Value },
    Batch { keys: Vec<Value> },
}

/// In-memory persister that records every commit it receives.
#[derive(Debug, Default)]
pub struct CommitLog {
    events: Mutex<Vec<CommitEvent>>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CommitEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn container_commits(&self) -> usize {
        self.count(|event| matches!(event, CommitEvent::Container { .. }))
    }

    pub fn record_commits(&self) -> usize {
        self.count(|event| matches!(event, CommitEvent::Record { .. }))
    }

    pub fn batch_commits(&self) -> usize {
        self.count(|event| matches!(event, CommitEvent::Batch { .. }))
    }

    pub fn last(&self) -> Option<CommitEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn reset(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn count(&self, filter: impl Fn(&CommitEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| filter(event))
            .count()
    }

    fn push(&self, event: CommitEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Persister for CommitLog {
    fn store(&self, object: Persistable) {
        let event = match object {
            Persistable::Container(entries) => CommitEvent::Container { len: entries.len() },
            Persistable::Record { key, .. } => CommitEvent::Record { key },
        };
        self.push(event);
    }

    fn store_all(&self, objects: Vec<Persistable>) {
        let keys = objects
            .iter()
            .filter_map(|object| object.key().cloned())
            .collect();
        self.push(CommitEvent::Batch { keys });
    }
}
