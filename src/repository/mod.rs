// ============================================================================
// Repository: dispatch table built once per declaration
// ============================================================================

mod base;
pub mod descriptor;
pub mod param;

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use crate::core::{Result, StoreError, Value};
use crate::query::{CompiledQuery, MethodKind, Page, Pageable, QueryOutput};
use crate::schema::{Entity, EntitySchema};
use crate::template::Template;

use base::BaseOperations;
pub use descriptor::{BASE_METHODS, MethodSignature, RepositoryDescriptor};
pub use param::Param;

/// Dispatch target for one declared method.
pub type Target<T> = Arc<dyn Fn(&[Param]) -> Result<QueryOutput<T>> + Send + Sync>;

/// Callable implementation of a repository declaration over entities `T`.
///
/// Every method is classified and compiled when the repository is built;
/// declaration errors (unknown fields, unsupported operators, unsupported
/// method names) are kept and raised each time the method is invoked.
pub struct Repository<T: Entity> {
    name: String,
    base: BaseOperations<T>,
    table: HashMap<String, Target<T>>,
    kinds: HashMap<String, MethodKind>,
}

impl<T: Entity> Repository<T> {
    pub fn build(descriptor: &RepositoryDescriptor, template: Template) -> Result<Self> {
        if !descriptor.manages::<T>() {
            return Err(StoreError::Mapping(format!(
                "Repository {} manages {}, not {}",
                descriptor.name,
                descriptor.entity_name,
                T::entity_name()
            )));
        }

        let schema: Arc<EntitySchema<T>> = template.schema::<T>()?;
        let base = BaseOperations::new(template.clone(), Arc::clone(&schema));
        let mut table: HashMap<String, Target<T>> = HashMap::new();
        let mut kinds = HashMap::new();

        for name in BASE_METHODS {
            table.insert(name.to_string(), base_target(&base, name));
            kinds.insert(name.to_string(), MethodKind::PlainForward);
        }

        for signature in &descriptor.methods {
            let kind = MethodKind::classify(&signature.name, signature.base);
            let target = match kind {
                MethodKind::PlainForward => base_target(&base, &signature.name),
                MethodKind::Unsupported => unsupported_target(&descriptor.name, &signature.name),
                _ => derived_target(
                    CompiledQuery::compile(&signature.name, signature.shape, Arc::clone(&schema)),
                    &template,
                    &descriptor.name,
                ),
            };
            table.insert(signature.name.clone(), target);
            kinds.insert(signature.name.clone(), kind);
        }

        tracing::debug!(
            repository = %descriptor.name,
            entity = T::entity_name(),
            methods = table.len(),
            "repository built"
        );

        Ok(Self {
            name: descriptor.name.clone(),
            base,
            table,
            kinds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification of a method in the dispatch table.
    pub fn kind(&self, method: &str) -> Option<MethodKind> {
        self.kinds.get(method).copied()
    }

    /// Calls a method by name.
    pub fn invoke(&self, method: &str, params: &[Param]) -> Result<QueryOutput<T>> {
        match self.table.get(method) {
            Some(target) => target(params),
            None => {
                warn!("{}: no method named {}", self.name, method);
                Err(StoreError::Unsupported(format!(
                    "Repository {} has no method {}",
                    self.name, method
                )))
            }
        }
    }

    // ========================================================================
    // Typed base vocabulary
    // ========================================================================

    pub fn save(&self, entity: T) -> Result<Arc<T>> {
        self.base.save(Arc::new(entity))
    }

    /// Re-stores a shared instance; in place when already held.
    pub fn save_shared(&self, entity: Arc<T>) -> Result<Arc<T>> {
        self.base.save(entity)
    }

    pub fn save_all(&self, entities: impl IntoIterator<Item = T>) -> Result<Vec<Arc<T>>> {
        self.base
            .save_all(entities.into_iter().map(Arc::new).collect())
    }

    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<Arc<T>>> {
        self.base.find_by_id(id.into())
    }

    pub fn exists_by_id(&self, id: impl Into<Value>) -> Result<bool> {
        self.base.exists_by_id(id.into())
    }

    pub fn find_all(&self) -> Result<Vec<Arc<T>>> {
        self.base.find_all()
    }

    pub fn find_all_paged(&self, pageable: Pageable) -> Result<Page<T>> {
        self.base.find_all_paged(pageable)
    }

    pub fn find_all_by_id<V: Into<Value>>(&self, ids: impl IntoIterator<Item = V>) -> Result<Vec<Arc<T>>> {
        self.base
            .find_all_by_id(ids.into_iter().map(Into::into).collect())
    }

    pub fn count(&self) -> Result<u64> {
        self.base.count()
    }

    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<()> {
        self.base.delete_by_id(id.into())
    }

    pub fn delete(&self, entity: &T) -> Result<()> {
        self.base.delete(entity)
    }

    pub fn delete_all_by_id<V: Into<Value>>(&self, ids: impl IntoIterator<Item = V>) -> Result<usize> {
        self.base
            .delete_all_by_id(ids.into_iter().map(Into::into).collect())
    }

    pub fn delete_all_entities(&self, entities: &[Arc<T>]) -> Result<usize> {
        self.base.delete_all_entities(entities)
    }

    /// Empties the backing store, not only this repository's type.
    pub fn delete_all(&self) -> Result<()> {
        self.base.delete_all()
    }
}

impl<T: Entity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<_> = self.kinds.iter().collect();
        methods.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_struct("Repository")
            .field("name", &self.name)
            .field("entity", &T::entity_name())
            .field("methods", &methods)
            .finish()
    }
}

fn base_target<T: Entity>(base: &BaseOperations<T>, method: &str) -> Target<T> {
    let base = base.clone();
    let method = method.to_string();
    Arc::new(move |params: &[Param]| base.dispatch(&method, params))
}

fn derived_target<T: Entity>(
    compiled: Result<CompiledQuery<T>>,
    template: &Template,
    repository: &str,
) -> Target<T> {
    match compiled {
        Ok(query) => {
            let store = Arc::clone(template.store());
            Arc::new(move |params: &[Param]| query.execute(&store, params))
        }
        Err(err) => {
            warn!("{}: method cannot be compiled: {}", repository, err);
            Arc::new(move |_: &[Param]| Err(err.clone()))
        }
    }
}

fn unsupported_target<T: Entity>(repository: &str, method: &str) -> Target<T> {
    let repository = repository.to_string();
    let method = method.to_string();
    Arc::new(move |_: &[Param]| {
        warn!("{}: method {} is not supported", repository, method);
        Err(StoreError::Unsupported(format!(
            "Repository method {} is not supported, derived queries start with findBy, deleteBy, countBy or existsBy",
            method
        )))
    })
}
