//! Bindings
//!
//! A binding ties one `(type, name)` key to a provider and a lifetime. A
//! singleton binding caches its instance in a `OnceCell`; initialization runs
//! inside the cell's lock, so concurrent callers never invoke the provider
//! twice, and a failed initialization leaves the cell empty for the next
//! attempt.

use crate::Result;
use crate::provider::{Erased, Lifetime, Provider, TypeInfo};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Registry entry for one `(type, name)` key
pub(crate) struct Binding {
    provider: Arc<Provider>,
    /// Type this binding is stored under
    key: TypeInfo,
    lifetime: Lifetime,
    instance: OnceCell<Erased>,
}

impl Binding {
    #[inline]
    pub fn new(provider: Arc<Provider>, key: TypeInfo, lifetime: Lifetime) -> Self {
        Self {
            provider,
            key,
            lifetime,
            instance: OnceCell::new(),
        }
    }

    #[inline]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    #[inline]
    pub fn key(&self) -> &TypeInfo {
        &self.key
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Cached singleton instance, if one was created
    #[inline]
    pub fn cached(&self) -> Option<&Erased> {
        self.instance.get()
    }

    /// Return the cached instance or create it with `init` under the cell's lock
    #[inline]
    pub fn get_or_try_init(&self, init: impl FnOnce() -> Result<Erased>) -> Result<&Erased> {
        self.instance.get_or_try_init(init)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key.to_string())
            .field("provider", &self.provider)
            .field("lifetime", &self.lifetime)
            .field("cached", &self.cached().is_some())
            .finish()
    }
}
