pub mod entity;
pub mod field;
pub mod registry;

pub use entity::{Attribute, AttributeKind, Entity, EntitySchema};
pub use field::{EntityComparator, FieldAccessor, Reader};
pub use registry::Entities;
