//! Dependency injection container
//!
//! The `Container` owns a registry of bindings, an error sink and a debug
//! tracing toggle. Registration happens up front; every lookup, resolve, fill
//! or call afterwards builds the requested object graph on demand.
//!
//! Operations come in two flavours. The plain methods (`get`, `resolve`,
//! `fill`, `call`, `singleton`, ...) report failures to the error sink, which
//! panics unless a handler was installed with
//! [`set_error_handler`](Container::set_error_handler). The `try_*` methods
//! return the error instead and never touch the sink.
//!
//! Registering bindings while other threads resolve from the same container
//! is not supported: register everything at startup, then resolve.

use crate::autowire::Autowire;
use crate::binding::Binding;
use crate::call::Callable;
use crate::context::ResolutionContext;
use crate::provider::{Declared, IntoProvider, Kind, Lifetime};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::tracer::Tracer;
use crate::{DiError, Result};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback receiving every failure reported by a container
pub type ErrorHandler = Arc<dyn Fn(DiError) + Send + Sync>;

/// Runtime object-graph builder.
///
/// Cloning is cheap and yields a handle to the same bindings.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Autowire, Container, Target};
/// use std::sync::Arc;
///
/// trait Shape: Autowire {
///     fn area(&self) -> u32;
/// }
///
/// struct Circle {
///     a: u32,
/// }
///
/// impl Autowire for Circle {
///     fn target(&self) -> Target<'_> {
///         Target::structure("Circle", Vec::new())
///     }
/// }
///
/// impl Shape for Circle {
///     fn area(&self) -> u32 {
///         self.a
///     }
/// }
///
/// let container = Container::new();
/// container.singleton(|| -> Arc<dyn Shape> { Arc::new(Circle { a: 13 }) });
///
/// let shape = container.get::<Arc<dyn Shape>>().unwrap();
/// assert_eq!(shape.area(), 13);
/// ```
#[derive(Clone)]
pub struct Container {
    /// Bindings by type and name
    registry: Arc<Registry>,
    /// Installed error handler; `None` means panic
    sink: Arc<RwLock<Option<ErrorHandler>>>,
    /// Debug toggle and optional log dispatch
    tracer: Arc<Tracer>,
}

impl Container {
    /// Create an empty container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graph_injector::Container;
    /// let container = Container::new();
    /// assert!(container.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            sink: Arc::new(RwLock::new(None)),
            tracer: Arc::new(Tracer::default()),
        }
    }

    #[inline]
    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, &self.tracer)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a provider whose instance is created on first use and shared
    /// for the life of the container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graph_injector::{Autowire, Container, Target};
    /// use std::sync::Arc;
    ///
    /// struct Database { url: String }
    ///
    /// impl Autowire for Database {
    ///     fn target(&self) -> Target<'_> {
    ///         Target::structure("Database", Vec::new())
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.singleton(|| Arc::new(Database { url: "postgres://localhost".into() }));
    ///
    /// let first = container.get::<Arc<Database>>().unwrap();
    /// let second = container.get::<Arc<Database>>().unwrap();
    /// assert!(Arc::ptr_eq(&first, &second));
    /// ```
    #[inline]
    pub fn singleton<M>(&self, provider: impl IntoProvider<M>) -> &Self {
        self.named_singleton("", provider)
    }

    /// Register a singleton provider under `name`.
    pub fn named_singleton<M>(&self, name: &str, provider: impl IntoProvider<M>) -> &Self {
        if let Err(err) = self.try_bind(provider, name, Lifetime::Singleton) {
            self.report(err);
        }
        self
    }

    /// Register a provider that runs once per top-level resolution.
    ///
    /// Within one `get`/`resolve`/`fill`/`call` every dependent shares the
    /// same instance; separate calls get separate instances.
    #[inline]
    pub fn instance<M>(&self, provider: impl IntoProvider<M>) -> &Self {
        self.named_instance("", provider)
    }

    /// Register an instance provider under `name`.
    pub fn named_instance<M>(&self, name: &str, provider: impl IntoProvider<M>) -> &Self {
        if let Err(err) = self.try_bind(provider, name, Lifetime::Instance) {
            self.report(err);
        }
        self
    }

    /// Validate `provider` and bind it under `(output type, name)`.
    ///
    /// A provider returning `Result<Arc<T>, E>` is also bound under
    /// `(E, name)`. A binding that already exists for a key is replaced. On
    /// error the registry is left unchanged.
    pub fn try_bind<M>(
        &self,
        provider: impl IntoProvider<M>,
        name: &str,
        lifetime: Lifetime,
    ) -> Result<()> {
        let provider = provider.into_provider();
        provider.validate()?;

        let provider = Arc::new(provider);
        for key in provider.keys() {
            debug_event!(
                self.tracer,
                op = "bind",
                service = key.name(),
                name = name,
                lifetime = %lifetime,
                provider = %provider.id(),
                "Registering provider"
            );

            let binding = Binding::new(Arc::clone(&provider), key, lifetime);
            self.registry.insert(key, name, binding);
        }
        Ok(())
    }

    /// Remove every binding. Cached singletons are released.
    pub fn reset(&self) {
        debug_event!(
            self.tracer,
            op = "reset",
            bindings = self.registry.len(),
            "Clearing all bindings"
        );
        self.registry.clear();
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolve `D` under the default name.
    ///
    /// `D` must be a reference type (`Arc<T>`, `Arc<dyn Trait>` or an
    /// `Option` of one). Failures go to the error sink and yield `None`.
    #[inline]
    pub fn get<D: Declared>(&self) -> Option<D> {
        self.named_get("")
    }

    /// Resolve `D` under `name`, reporting failures to the error sink.
    pub fn named_get<D: Declared>(&self, name: &str) -> Option<D> {
        match self.try_named_get(name) {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    #[inline]
    pub fn try_get<D: Declared>(&self) -> Result<D> {
        self.try_named_get("")
    }

    /// Resolve `D` under `name`, returning any failure.
    pub fn try_named_get<D: Declared>(&self, name: &str) -> Result<D> {
        let declared = D::declared();
        if !declared.kind().is_reference() {
            return Err(DiError::InvalidTarget {
                type_name: declared.name(),
            });
        }

        let mut ctx = ResolutionContext::new();
        let instance = self.resolver().resolve(&declared, name, &mut ctx)?;
        D::from_erased(&instance).ok_or_else(|| DiError::mismatch(declared.name()))
    }

    /// Resolve into `destination` under the default name.
    ///
    /// Failures go to the error sink and leave `destination` untouched.
    #[inline]
    pub fn resolve<D: Declared>(&self, destination: &mut D) {
        self.named_resolve(destination, "");
    }

    /// Resolve into `destination` under `name`, reporting failures to the error sink.
    pub fn named_resolve<D: Declared>(&self, destination: &mut D, name: &str) {
        if let Err(err) = self.try_named_resolve(destination, name) {
            self.report(err);
        }
    }

    #[inline]
    pub fn try_resolve<D: Declared>(&self, destination: &mut D) -> Result<()> {
        self.try_named_resolve(destination, "")
    }

    /// Resolve into `destination` under `name`, returning any failure.
    ///
    /// A destination holding a struct by value fails with
    /// [`DiError::PassedByValue`] when `Arc` of that struct is bound.
    pub fn try_named_resolve<D: Declared>(&self, destination: &mut D, name: &str) -> Result<()> {
        let declared = D::declared();
        if !matches!(declared.kind(), Kind::Reference | Kind::Struct) {
            return Err(DiError::InvalidTarget {
                type_name: declared.name(),
            });
        }

        if !self.registry.contains(declared.id(), name) {
            let by_reference = declared
                .reference_id()
                .is_some_and(|reference| self.registry.contains(reference, name));
            return Err(if by_reference {
                DiError::PassedByValue {
                    type_name: declared.name(),
                }
            } else {
                DiError::not_found(declared.name(), name)
            });
        }

        let mut ctx = ResolutionContext::new();
        let instance = self.resolver().resolve(&declared, name, &mut ctx)?;
        *destination = D::from_erased(&instance).ok_or_else(|| DiError::mismatch(declared.name()))?;
        Ok(())
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    /// Populate the tagged fields of `target`, reporting failures to the error sink.
    ///
    /// Fields written before a failing field keep their values.
    #[inline]
    pub fn fill<W: Autowire + ?Sized>(&self, target: &W) {
        if let Err(err) = self.try_fill(target) {
            self.report(err);
        }
    }

    /// Populate the tagged fields of `target`, returning any failure.
    pub fn try_fill<W: Autowire + ?Sized>(&self, target: &W) -> Result<()> {
        let mut ctx = ResolutionContext::new();
        self.resolver().fill(target.target(), &mut ctx)
    }

    /// Run `function` with every parameter resolved under the default name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graph_injector::{Autowire, Container, Target};
    /// use std::sync::Arc;
    ///
    /// struct Clock;
    ///
    /// impl Autowire for Clock {
    ///     fn target(&self) -> Target<'_> {
    ///         Target::structure("Clock", Vec::new())
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.instance(|| Arc::new(Clock));
    ///
    /// let mut called = false;
    /// container.call(|_clock: Arc<Clock>| called = true);
    /// assert!(called);
    /// ```
    pub fn call<M, F: Callable<M>>(&self, function: F) {
        if let Err(err) = self.try_call(function) {
            self.report(err);
        }
    }

    /// Run `function` with resolved arguments, returning any failure.
    #[inline]
    pub fn try_call<M, F: Callable<M>>(&self, function: F) -> Result<()> {
        self.resolver().call(function)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Check if `D` is bound under the default name
    #[inline]
    pub fn contains<D: Declared>(&self) -> bool {
        self.contains_named::<D>("")
    }

    #[inline]
    pub fn contains_named<D: Declared>(&self, name: &str) -> bool {
        self.registry.contains(D::declared().id(), name)
    }

    /// Number of `(type, name)` bindings
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // =========================================================================
    // Error sink
    // =========================================================================

    /// Install `handler` as the receiver of every reported failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graph_injector::{Autowire, Container, DiError};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let errors = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&errors);
    ///
    /// let container = Container::new();
    /// container.set_error_handler(move |err: DiError| sink.lock().unwrap().push(err));
    ///
    /// assert!(container.get::<Arc<dyn Autowire>>().is_none());
    /// assert_eq!(errors.lock().unwrap().len(), 1);
    /// ```
    pub fn set_error_handler(&self, handler: impl Fn(DiError) + Send + Sync + 'static) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Restore the default sink, which panics
    pub fn clear_error_handler(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Hand `err` to the installed handler, or panic if there is none.
    fn report(&self, err: DiError) {
        debug_event!(self.tracer, op = "error", error = %err, "Reporting failure");

        let handler = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(err),
            None => panic!("{err}"),
        }
    }

    // =========================================================================
    // Tracing
    // =========================================================================

    /// Emit `debug` events for every registration, resolution and fill step.
    pub fn enable_debug_logging(&self) {
        self.tracer.enable();
    }

    pub fn disable_debug_logging(&self) {
        self.tracer.disable();
    }

    #[inline]
    pub fn is_debug_logging(&self) -> bool {
        self.tracer.is_enabled()
    }

    /// Send this container's debug events to `dispatch` instead of the
    /// global subscriber.
    #[cfg(feature = "logging")]
    pub fn set_log_dispatch(&self, dispatch: tracing::Dispatch) {
        self.tracer.set_dispatch(dispatch);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("binding_count", &self.len())
            .field("debug_logging", &self.is_debug_logging())
            .finish()
    }
}
