//! The process-wide default container
//!
//! Created on first access and never torn down. The free functions here are
//! shorthands for the same operations on [`global()`]; independent
//! containers can be created with [`Container::new`] at any time.

use crate::DiError;
use crate::autowire::Autowire;
use crate::call::Callable;
use crate::container::Container;
use crate::provider::{Declared, IntoProvider};
use once_cell::sync::Lazy;

static GLOBAL: Lazy<Container> = Lazy::new(Container::new);

/// The default container.
///
/// # Examples
///
/// ```rust
/// use graph_injector::global;
///
/// global().enable_debug_logging();
/// assert!(global().is_debug_logging());
/// global().disable_debug_logging();
/// ```
#[inline]
pub fn global() -> &'static Container {
    &GLOBAL
}

/// Register a singleton provider on the default container.
#[inline]
pub fn singleton<M>(provider: impl IntoProvider<M>) -> &'static Container {
    global().singleton(provider)
}

#[inline]
pub fn named_singleton<M>(name: &str, provider: impl IntoProvider<M>) -> &'static Container {
    global().named_singleton(name, provider)
}

/// Register an instance provider on the default container.
#[inline]
pub fn instance<M>(provider: impl IntoProvider<M>) -> &'static Container {
    global().instance(provider)
}

#[inline]
pub fn named_instance<M>(name: &str, provider: impl IntoProvider<M>) -> &'static Container {
    global().named_instance(name, provider)
}

/// Remove every binding from the default container.
#[inline]
pub fn reset() {
    global().reset();
}

#[inline]
pub fn get<D: Declared>() -> Option<D> {
    global().get()
}

#[inline]
pub fn named_get<D: Declared>(name: &str) -> Option<D> {
    global().named_get(name)
}

#[inline]
pub fn resolve<D: Declared>(destination: &mut D) {
    global().resolve(destination);
}

#[inline]
pub fn named_resolve<D: Declared>(destination: &mut D, name: &str) {
    global().named_resolve(destination, name);
}

/// Populate the tagged fields of `target` from the default container.
#[inline]
pub fn fill<W: Autowire + ?Sized>(target: &W) {
    global().fill(target);
}

#[inline]
pub fn call<M, F: Callable<M>>(function: F) {
    global().call(function);
}

#[inline]
pub fn set_error_handler(handler: impl Fn(DiError) + Send + Sync + 'static) {
    global().set_error_handler(handler);
}

/// Restore the default sink, which panics on the first failure.
#[inline]
pub fn clear_error_handler() {
    global().clear_error_handler();
}

#[inline]
pub fn enable_debug_logging() {
    global().enable_debug_logging();
}

#[inline]
pub fn disable_debug_logging() {
    global().disable_debug_logging();
}

/// Send the default container's debug events to `dispatch`.
#[cfg(feature = "logging")]
#[inline]
pub fn set_log_dispatch(dispatch: tracing::Dispatch) {
    global().set_log_dispatch(dispatch);
}
