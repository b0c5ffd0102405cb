//! Binding registry
//!
//! Two-level map from binding key to name to binding. The outer level is a
//! `DashMap` so lookups from concurrent resolutions do not contend; bindings
//! are handed out as `Arc`s so no shard lock is held while a provider runs.

use crate::binding::Binding;
use crate::provider::TypeInfo;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

type Named = HashMap<String, Arc<Binding>, RandomState>;

pub(crate) struct Registry {
    bindings: DashMap<TypeId, Named, RandomState>,
}

impl Registry {
    /// Create an empty registry with a small shard count.
    ///
    /// Containers typically hold a few dozen bindings; the default of
    /// `num_cpus * 4` shards mostly costs creation time.
    #[inline]
    pub fn new() -> Self {
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Store a binding under `(key, name)`, replacing any previous one
    pub fn insert(&self, key: TypeInfo, name: &str, binding: Binding) -> Option<Arc<Binding>> {
        self.bindings
            .entry(key.id())
            .or_default()
            .insert(name.to_owned(), Arc::new(binding))
    }

    /// Binding for `(key, name)`; exact match only
    #[inline]
    pub fn get(&self, key: TypeId, name: &str) -> Option<Arc<Binding>> {
        self.bindings
            .get(&key)
            .and_then(|named| named.get(name).map(Arc::clone))
    }

    #[inline]
    pub fn contains(&self, key: TypeId, name: &str) -> bool {
        self.bindings
            .get(&key)
            .is_some_and(|named| named.contains_key(name))
    }

    /// Number of `(type, name)` bindings
    pub fn len(&self) -> usize {
        self.bindings.iter().map(|named| named.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every binding, orphaning cached singletons
    #[inline]
    pub fn clear(&self) {
        self.bindings.clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autowire::{Autowire, Target};
    use crate::provider::{IntoProvider, Lifetime};

    struct TestService;

    impl Autowire for TestService {
        fn target(&self) -> Target<'_> {
            Target::structure("TestService", Vec::new())
        }
    }

    fn binding(lifetime: Lifetime) -> (TypeInfo, Binding) {
        let provider = Arc::new((|| Arc::new(TestService)).into_provider());
        let key = provider.keys()[0];
        (key, Binding::new(provider, key, lifetime))
    }

    #[test]
    fn test_registry_insert_and_get() {
        let registry = Registry::new();
        let (key, b) = binding(Lifetime::Singleton);

        assert!(registry.insert(key, "", b).is_none());
        assert!(registry.get(key.id(), "").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_exact_name_match() {
        let registry = Registry::new();
        let (key, b) = binding(Lifetime::Instance);
        registry.insert(key, "x", b);

        assert!(registry.contains(key.id(), "x"));
        assert!(!registry.contains(key.id(), ""));
        assert!(!registry.contains(key.id(), "y"));
        assert!(!registry.contains(TypeId::of::<TestService>(), "x"));
    }

    #[test]
    fn test_registry_replace() {
        let registry = Registry::new();
        let (key, first) = binding(Lifetime::Singleton);
        let (_, second) = binding(Lifetime::Instance);

        registry.insert(key, "", first);
        let replaced = registry.insert(key, "", second).unwrap();

        assert_eq!(replaced.lifetime(), Lifetime::Singleton);
        assert_eq!(registry.get(key.id(), "").unwrap().lifetime(), Lifetime::Instance);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_clear() {
        let registry = Registry::new();
        let (key, b) = binding(Lifetime::Singleton);
        registry.insert(key, "", b);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(key.id(), "").is_none());
    }
}
