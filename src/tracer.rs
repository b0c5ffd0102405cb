//! Per-container debug tracing
//!
//! Events are only produced while the container's debug toggle is on. They
//! go to the dispatch attached with [`Tracer::set_dispatch`] when there is
//! one, and to the global `tracing` subscriber otherwise.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use std::sync::{PoisonError, RwLock};

/// Emit a `debug` event with target `graph_injector` through a [`Tracer`].
///
/// Expands to nothing without the `logging` feature.
macro_rules! debug_event {
    ($tracer:expr, $($arg:tt)+) => {
        #[cfg(feature = "logging")]
        $tracer.emit(|| ::tracing::debug!(target: "graph_injector", $($arg)+));
    };
}

#[derive(Default)]
pub(crate) struct Tracer {
    enabled: AtomicBool,
    #[cfg(feature = "logging")]
    dispatch: RwLock<Option<tracing::Dispatch>>,
}

impl Tracer {
    #[inline]
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Route this container's events to `dispatch` instead of the global subscriber
    #[cfg(feature = "logging")]
    pub fn set_dispatch(&self, dispatch: tracing::Dispatch) {
        *self
            .dispatch
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(dispatch);
    }

    /// Run `event` if tracing is on, under the attached dispatch if any
    #[cfg(feature = "logging")]
    pub fn emit(&self, event: impl FnOnce()) {
        if !self.is_enabled() {
            return;
        }

        let dispatch = self
            .dispatch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, event),
            None => event(),
        }
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
