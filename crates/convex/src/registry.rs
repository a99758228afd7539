//! Process-wide transformer registry
//!
//! Reads happen on every transformed call, writes only at initialization (the generated
//! `install()` hook) and on manual registration, so the store is an `RwLock` around a hash map.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::markers::TransformerId;
use crate::transformer::{Identified, Transformer};

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The registry shared by the whole process
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Concurrency-safe map from transformer id to its shared instance
pub struct Registry {
    entries: RwLock<AHashMap<TransformerId, Arc<dyn Transformer>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: RwLock::new(AHashMap::new()),
        }
    }

    /// Register an instance under its type's id, returning the one it replaced
    pub fn register<T: Transformer + Identified>(&self, transformer: T) -> Option<Arc<dyn Transformer>> {
        self.register_as(TransformerId::of::<T>(), Arc::new(transformer))
    }

    /// Register an instance under an explicit id, returning the one it replaced
    pub fn register_as(
        &self,
        id: impl Into<TransformerId>,
        transformer: Arc<dyn Transformer>,
    ) -> Option<Arc<dyn Transformer>> {
        let id = id.into();
        debug!("Registering transformer {}", id);
        self.entries.write().insert(id, transformer)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Transformer>> {
        self.entries.read().get(id).cloned()
    }

    /// Look up `T`, constructing and registering it on first use.
    ///
    /// Concurrent callers racing on the same id all receive the instance that won.
    pub fn get_or_init<T: Transformer + Identified + Default>(&self) -> Arc<dyn Transformer> {
        if let Some(existing) = self.get(T::ID) {
            return existing;
        }
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(TransformerId::of::<T>())
                .or_insert_with(|| {
                    debug!("Constructing transformer {} on first use", T::ID);
                    Arc::new(T::default())
                }),
        )
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered ids in lexical order
    pub fn ids(&self) -> Vec<TransformerId> {
        let mut ids: Vec<TransformerId> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of every entry, sorted by id
    pub fn all(&self) -> Vec<(TransformerId, Arc<dyn Transformer>)> {
        let mut entries: Vec<(TransformerId, Arc<dyn Transformer>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, transformer)| (id.clone(), Arc::clone(transformer)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Merge a generated table into the registry.
    ///
    /// Table entries win over earlier registrations under the same id. Returns the number of
    /// entries merged.
    pub fn merge(&self, table: &GeneratedTable) -> usize {
        let mut entries = self.entries.write();
        for (id, transformer) in table.iter() {
            if entries.insert(id.clone(), Arc::clone(transformer)).is_some() {
                debug!("Generated entry replaced registration of {}", id);
            }
        }
        info!(
            "Merged {} generated transformers, registry now holds {}",
            table.len(),
            entries.len()
        );
        table.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("ids", &self.ids()).finish()
    }
}

/// Static table emitted by the build pipeline, one entry per manifest id
#[derive(Default, Clone)]
pub struct GeneratedTable {
    entries: BTreeMap<TransformerId, Arc<dyn Transformer>>,
}

impl GeneratedTable {
    pub fn new() -> Self {
        GeneratedTable::default()
    }

    pub fn insert<T: Transformer + Identified>(&mut self, transformer: T) {
        self.insert_as(TransformerId::of::<T>(), Arc::new(transformer));
    }

    pub fn insert_as(&mut self, id: impl Into<TransformerId>, transformer: Arc<dyn Transformer>) {
        self.entries.insert(id.into(), transformer);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Transformer>> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TransformerId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransformerId, &Arc<dyn Transformer>)> {
        self.entries.iter()
    }
}

impl fmt::Debug for GeneratedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
