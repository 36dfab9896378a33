//! Initialized-once cache of compiled binding schemas.

use crate::error::SchemaError;
use crate::schema::{Bindable, SchemaBuilder, ScopeEdge, TypeDescriptor};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::debug;

type ErasedDescriptor = Arc<dyn Any + Send + Sync>;

struct Entry {
    type_name: &'static str,
    descriptor: ErasedDescriptor,
    scope_edges: Vec<ScopeEdge>,
}

/// Owned cache of [`TypeDescriptor`]s, one per [`Bindable`] type.
///
/// A type's schema is compiled the first time it is requested, together
/// with the schemas of every type it nests, so an invalid path anywhere in
/// the graph is reported by that first request. Types that nest each other
/// resolve by reference: a type already in the cache is not rebuilt. A
/// cycle of nested fields that never descend below their scope node is
/// rejected, since extracting it would never terminate.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Entry>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get `T`'s descriptor, building it (and its dependencies) on first use.
    ///
    /// # Errors
    /// Returns the first [`SchemaError`] found in `T` or any type it nests.
    pub fn schema<T: Bindable>(&self) -> Result<Arc<TypeDescriptor<T>>, SchemaError> {
        if let Some(cached) = self.cached::<T>() {
            return Ok(cached);
        }

        let built = Arc::new(T::bind(SchemaBuilder::new()).finish()?);
        let descriptor = {
            let mut cache = self
                .schemas
                .write()
                .expect("acquire write lock on schemas");
            let entry = cache.entry(TypeId::of::<T>()).or_insert_with(|| Entry {
                type_name: T::TYPE_NAME,
                descriptor: Arc::clone(&built) as ErasedDescriptor,
                scope_edges: built.scope_edges().to_vec(),
            });
            downcast::<T>(Arc::clone(&entry.descriptor)).unwrap_or(built)
        };

        let resolved = descriptor
            .dependencies()
            .iter()
            .try_for_each(|dependency| dependency(self))
            .and_then(|()| self.check_scope_cycle(TypeId::of::<T>()));
        if let Err(err) = resolved {
            self.schemas
                .write()
                .expect("acquire write lock on schemas")
                .remove(&TypeId::of::<T>());
            return Err(err);
        }

        debug!(
            type_name = T::TYPE_NAME,
            fields = descriptor.fields().count(),
            "built binding schema"
        );
        Ok(descriptor)
    }

    /// Build `T`'s schema now so configuration mistakes surface at start-up.
    pub fn preload<T: Bindable>(&self) -> Result<(), SchemaError> {
        self.schema::<T>().map(|_| ())
    }

    /// Number of cached schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .expect("acquire read lock on schemas")
            .len()
    }

    /// True when nothing has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `T`'s schema is already cached.
    #[must_use]
    pub fn contains<T: Bindable>(&self) -> bool {
        self.schemas
            .read()
            .expect("acquire read lock on schemas")
            .contains_key(&TypeId::of::<T>())
    }

    fn cached<T: Bindable>(&self) -> Option<Arc<TypeDescriptor<T>>> {
        let cache = self.schemas.read().expect("acquire read lock on schemas");
        cache
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(&entry.descriptor))
            .and_then(downcast::<T>)
    }

    /// Fail if `start` can reach itself through scope edges alone.
    ///
    /// Every member of such a cycle is checked once the last of them is
    /// cached, so a cycle that avoids `start` is caught by one of its own
    /// members.
    fn check_scope_cycle(&self, start: TypeId) -> Result<(), SchemaError> {
        let cache = self.schemas.read().expect("acquire read lock on schemas");
        let mut pending = vec![start];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            let Some(entry) = cache.get(&current) else {
                continue;
            };
            for edge in &entry.scope_edges {
                if edge.target == start {
                    return Err(SchemaError::SelfRecursion {
                        type_name: entry.type_name,
                        field: edge.field,
                        path: edge.path.clone(),
                    });
                }
                if seen.insert(edge.target) {
                    pending.push(edge.target);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.len())
            .finish()
    }
}

fn downcast<T: Bindable>(erased: ErasedDescriptor) -> Option<Arc<TypeDescriptor<T>>> {
    erased.downcast::<TypeDescriptor<T>>().ok()
}
