use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Result, StoreError};
use crate::schema::entity::{Entity, EntitySchema};

/// The set of entity types known to a template, built once at startup.
#[derive(Default, Clone)]
pub struct Entities {
    schemas: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    names: Vec<&'static str>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, failing if its schema cannot be built.
    pub fn with<T: Entity>(mut self) -> Result<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn register<T: Entity>(&mut self) -> Result<Arc<EntitySchema<T>>> {
        if let Ok(existing) = self.metadata::<T>() {
            return Ok(existing);
        }
        let schema = Arc::new(EntitySchema::<T>::of()?);
        self.schemas.insert(
            TypeId::of::<T>(),
            Arc::clone(&schema) as Arc<dyn Any + Send + Sync>,
        );
        self.names.push(schema.name());
        tracing::debug!(entity = schema.name(), "registered entity schema");
        Ok(schema)
    }

    pub fn metadata<T: Entity>(&self) -> Result<Arc<EntitySchema<T>>> {
        self.schemas
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|schema| schema.downcast::<EntitySchema<T>>().ok())
            .ok_or_else(|| {
                StoreError::Mapping(format!(
                    "Entity {} is not registered",
                    T::entity_name()
                ))
            })
    }

    pub fn contains<T: Entity>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<T>())
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl std::fmt::Debug for Entities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities").field("names", &self.names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::schema::entity::Attribute;

    #[derive(Debug)]
    struct Pen {
        sku: i64,
    }

    impl Entity for Pen {
        fn entity_name() -> &'static str {
            "Pen"
        }

        fn attributes() -> Vec<Attribute<Self>> {
            vec![Attribute::id("sku", |p: &Pen| Value::from(p.sku))]
        }
    }

    #[derive(Debug)]
    struct Ink;

    impl Entity for Ink {
        fn entity_name() -> &'static str {
            "Ink"
        }

        fn attributes() -> Vec<Attribute<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let entities = Entities::new().with::<Pen>().unwrap();
        assert!(entities.contains::<Pen>());
        assert_eq!(entities.names(), &["Pen"]);
        assert_eq!(entities.metadata::<Pen>().unwrap().id().name(), "sku");
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut entities = Entities::new();
        let first = entities.register::<Pen>().unwrap();
        let second = entities.register::<Pen>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn test_unknown_entity_is_mapping_error() {
        let entities = Entities::new();
        assert!(matches!(
            entities.metadata::<Pen>(),
            Err(StoreError::Mapping(_))
        ));
        assert!(Entities::new().with::<Ink>().is_err());
    }
}
