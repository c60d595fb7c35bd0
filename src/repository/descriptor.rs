use std::any::TypeId;

use crate::query::ReturnShape;
use crate::schema::Entity;

/// Base vocabulary every repository answers, whether declared or not.
pub const BASE_METHODS: [&str; 11] = [
    "save",
    "saveAll",
    "findById",
    "existsById",
    "findAll",
    "findAllById",
    "count",
    "deleteById",
    "delete",
    "deleteAll",
    "deleteAllById",
];

/// A declared repository method: name, return shape and whether the
/// declaration comes from the base vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub shape: ReturnShape,
    pub base: bool,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, shape: ReturnShape) -> Self {
        Self {
            name: name.into(),
            shape,
            base: false,
        }
    }

    /// Declared with a return type name, e.g. `"List<Book>"`.
    pub fn returning(name: impl Into<String>, declared_type: &str) -> Self {
        Self::new(name, ReturnShape::of(declared_type))
    }

    /// A method inherited from the base vocabulary.
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: ReturnShape::Single,
            base: true,
        }
    }
}

/// Repository declaration produced by discovery: a name, the entity type it
/// manages and its declared methods.
#[derive(Debug, Clone)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub entity: TypeId,
    pub entity_name: &'static str,
    pub methods: Vec<MethodSignature>,
}

impl RepositoryDescriptor {
    pub fn new<T: Entity>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: TypeId::of::<T>(),
            entity_name: T::entity_name(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }

    /// Shorthand for `method(MethodSignature::new(name, shape))`.
    pub fn query(self, name: impl Into<String>, shape: ReturnShape) -> Self {
        self.method(MethodSignature::new(name, shape))
    }

    pub fn manages<T: Entity>(&self) -> bool {
        self.entity == TypeId::of::<T>()
    }
}
