use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Anything the object store can hold.
///
/// Implemented for every `'static + Send + Sync + Debug` type, so entities
/// of different kinds share one container.
pub trait StoredObject: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + fmt::Debug> StoredObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Shared handle to a stored instance. Identity is the allocation.
pub type Record = Arc<dyn StoredObject>;

pub fn record<T: StoredObject>(value: T) -> Record {
    Arc::new(value)
}

/// Wrap an already shared instance without copying it.
pub fn record_from_arc<T: StoredObject>(value: Arc<T>) -> Record {
    value
}

/// True when both handles point at the same instance.
pub fn same_instance(a: &Record, b: &Record) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

pub fn is_instance_of<T: Any>(record: &Record) -> bool {
    (**record).as_any().is::<T>()
}

pub fn downcast_ref<T: Any>(record: &Record) -> Option<&T> {
    (**record).as_any().downcast_ref::<T>()
}

pub fn downcast<T: Any + Send + Sync>(record: &Record) -> Option<Arc<T>> {
    StoredObject::into_any(Arc::clone(record)).downcast::<T>().ok()
}
