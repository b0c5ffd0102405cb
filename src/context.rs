//! Resolution context
//!
//! One context lives for exactly one top-level `get`/`resolve`/`fill`/`call`.
//! It remembers every instance created during that call, keyed by provider
//! identity and name, so that a graph that refers back to a node already
//! being built receives the same reference instead of recursing forever.

use crate::provider::{Erased, ProviderId};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct ResolutionContext {
    instances: HashMap<ProviderId, HashMap<String, Erased, RandomState>, RandomState>,
    depth: usize,
}

impl ResolutionContext {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance created earlier in this call by `provider` under `name`
    #[inline]
    pub fn get(&self, provider: ProviderId, name: &str) -> Option<&Erased> {
        self.instances.get(&provider)?.get(name)
    }

    /// Record an instance. Callers insert before wiring the instance's fields.
    pub fn insert(&mut self, provider: ProviderId, name: &str, instance: &Erased) {
        self.instances
            .entry(provider)
            .or_default()
            .insert(name.to_owned(), Arc::clone(instance));
    }

    /// Number of distinct instances recorded
    pub fn len(&self) -> usize {
        self.instances.values().map(HashMap::len).sum()
    }

    /// Current wiring depth, for tracing
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn enter(&mut self) {
        self.depth += 1;
    }

    #[inline]
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("instances", &self.len())
            .field("depth", &self.depth)
            .finish()
    }
}
