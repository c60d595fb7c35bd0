use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::core::{Result, StoreError, Value};
use crate::schema::field::{FieldAccessor, Reader};
use crate::storage::{Record, downcast, is_instance_of, record_from_arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// The lookup key in the object store.
    Id,
    /// A stored value field.
    Column,
}

/// One declared attribute of an entity type.
pub struct Attribute<T> {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub read: Reader<T>,
}

impl<T> Attribute<T> {
    pub fn id(name: &'static str, read: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self {
            name,
            kind: AttributeKind::Id,
            read: Arc::new(read),
        }
    }

    pub fn column(name: &'static str, read: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self {
            name,
            kind: AttributeKind::Column,
            read: Arc::new(read),
        }
    }
}

/// A type that can be kept in the object store.
///
/// Usually derived with `#[derive(Entity)]`:
///
/// ```
/// use memrepo::Entity;
///
/// #[derive(Debug, Clone, Entity)]
/// struct Car {
///     #[id]
///     plate: String,
///     #[column]
///     model: String,
/// }
///
/// assert_eq!(Car::entity_name(), "Car");
/// assert_eq!(Car::attributes().len(), 2);
/// ```
pub trait Entity: Any + Send + Sync + fmt::Debug + Sized {
    fn entity_name() -> &'static str;

    fn attributes() -> Vec<Attribute<Self>>;
}

/// Per-type descriptor: identifier accessor plus value fields in
/// declaration order. Immutable once built.
pub struct EntitySchema<T> {
    name: &'static str,
    id: FieldAccessor<T>,
    fields: Vec<FieldAccessor<T>>,
}

impl<T: Entity> EntitySchema<T> {
    pub fn of() -> Result<Self> {
        let name = T::entity_name();
        let mut id = None;
        let mut fields = Vec::new();

        for attribute in T::attributes() {
            let accessor = FieldAccessor::new(attribute.name, name, attribute.read);
            match attribute.kind {
                AttributeKind::Id if id.is_some() => {
                    return Err(StoreError::Mapping(format!(
                        "{} declares more than one identifier",
                        name
                    )));
                }
                AttributeKind::Id => id = Some(accessor),
                AttributeKind::Column => fields.push(accessor),
            }
        }

        let id = id.ok_or_else(|| {
            StoreError::Mapping(format!("missing identifier on entity {}", name))
        })?;

        Ok(Self { name, id, fields })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> &FieldAccessor<T> {
        &self.id
    }

    pub fn fields(&self) -> &[FieldAccessor<T>] {
        &self.fields
    }

    /// Exact lookup: the identifier first, then value fields.
    pub fn field(&self, name: &str) -> Option<&FieldAccessor<T>> {
        if self.id.name() == name {
            return Some(&self.id);
        }
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Lookup for names coming out of method names or sort requests:
    /// exact first, then snake case (`releaseYear` -> `release_year`).
    pub fn resolve(&self, name: &str) -> Result<&FieldAccessor<T>> {
        self.field(name)
            .or_else(|| self.field(&to_snake_case(name)))
            .ok_or_else(|| {
                StoreError::Mapping(format!(
                    "There is no field '{}' on entity {}",
                    name, self.name
                ))
            })
    }

    /// Identifier value of `instance`; a NULL identifier is rejected.
    pub fn key(&self, instance: &T) -> Result<Value> {
        let key = self.id.get(instance);
        if key.is_null() {
            return Err(StoreError::Argument(format!(
                "{} has a null identifier '{}'",
                self.name,
                self.id.name()
            )));
        }
        Ok(key)
    }

    /// Splits an instance into its store entry.
    pub fn entry(&self, instance: Arc<T>) -> Result<(Value, Record)> {
        let key = self.key(&instance)?;
        Ok((key, record_from_arc(instance)))
    }

    pub fn is_instance(&self, record: &Record) -> bool {
        is_instance_of::<T>(record)
    }

    pub fn downcast(&self, record: &Record) -> Option<Arc<T>> {
        downcast::<T>(record)
    }
}

impl<T> fmt::Debug for EntitySchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .finish()
    }
}

pub(crate) fn decapitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Album {
        code: String,
        release_year: i32,
    }

    impl Entity for Album {
        fn entity_name() -> &'static str {
            "Album"
        }

        fn attributes() -> Vec<Attribute<Self>> {
            vec![
                Attribute::id("code", |a: &Album| Value::from(&a.code)),
                Attribute::column("release_year", |a: &Album| Value::from(a.release_year)),
            ]
        }
    }

    #[derive(Debug)]
    struct Loose;

    impl Entity for Loose {
        fn entity_name() -> &'static str {
            "Loose"
        }

        fn attributes() -> Vec<Attribute<Self>> {
            vec![Attribute::column("name", |_: &Loose| Value::Null)]
        }
    }

    #[derive(Debug)]
    struct Twice;

    impl Entity for Twice {
        fn entity_name() -> &'static str {
            "Twice"
        }

        fn attributes() -> Vec<Attribute<Self>> {
            vec![
                Attribute::id("a", |_: &Twice| Value::from(1)),
                Attribute::id("b", |_: &Twice| Value::from(2)),
            ]
        }
    }

    #[test]
    fn test_schema_splits_id_and_fields() {
        let schema = EntitySchema::<Album>::of().unwrap();
        assert_eq!(schema.id().name(), "code");
        assert_eq!(schema.fields().len(), 1);
        assert_eq!(schema.field("code"), Some(schema.id()));
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_missing_identifier_is_mapping_error() {
        let err = EntitySchema::<Loose>::of().unwrap_err();
        assert!(matches!(err, StoreError::Mapping(msg) if msg.contains("missing identifier")));
    }

    #[test]
    fn test_duplicate_identifier_is_mapping_error() {
        assert!(matches!(
            EntitySchema::<Twice>::of(),
            Err(StoreError::Mapping(_))
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_snake_case() {
        let schema = EntitySchema::<Album>::of().unwrap();
        assert_eq!(schema.resolve("releaseYear").unwrap().name(), "release_year");
        assert!(schema.resolve("genre").is_err());
    }

    #[test]
    fn test_entry_keeps_instance_identity() {
        let schema = EntitySchema::<Album>::of().unwrap();
        let album = Arc::new(Album {
            code: "A1".into(),
            release_year: 1999,
        });
        let (key, rec) = schema.entry(Arc::clone(&album)).unwrap();
        assert_eq!(key, Value::from("A1"));
        assert!(Arc::ptr_eq(&album, &schema.downcast(&rec).unwrap()));
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(decapitalize("ReleaseYear"), "releaseYear");
        assert_eq!(to_snake_case("releaseYear"), "release_year");
        assert_eq!(to_snake_case("isbn"), "isbn");
    }
}
