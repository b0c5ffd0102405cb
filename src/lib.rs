//! # graph-injector - Runtime Object-Graph Builder for Rust
//!
//! Register zero-argument providers keyed by the type they return (plus an
//! optional name), then ask the container for a value, hand it a struct to
//! fill, or give it a closure to call. The container builds the whole object
//! graph on demand, wiring tagged fields recursively.
//!
//! ## Features
//!
//! - **Type-keyed bindings** - exact `(type, name)` matching, no fallback
//! - **Two lifetimes** - lazy singletons, or one instance per top-level call
//! - **Cycle-safe** - mutually referential graphs resolve to shared references
//! - **Field auto-wiring** - `#[derive(Autowire)]` with `#[di = "type"]` / `#[di = "name"]`
//! - **Pluggable error sink** - panics by default, or hand failures to a callback
//! - **Observable** - optional per-container `tracing` events
//!
//! ## Quick Start
//!
//! ```rust
//! use graph_injector::{Autowire, Container, Inject};
//! use std::sync::Arc;
//!
//! #[derive(Autowire)]
//! struct Database {
//!     url: String,
//! }
//!
//! #[derive(Autowire, Default)]
//! struct UserService {
//!     #[di = "type"]
//!     db: Inject<Database>,
//! }
//!
//! let container = Container::new();
//! container
//!     .singleton(|| Arc::new(Database { url: "postgres://localhost".into() }))
//!     .instance(|| Arc::new(UserService::default()));
//!
//! // Fields are wired when the instance is created
//! let users = container.get::<Arc<UserService>>().unwrap();
//! assert_eq!(users.db.get().unwrap().url, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! ```rust
//! use graph_injector::{Autowire, Container};
//! use std::sync::Arc;
//!
//! #[derive(Autowire)]
//! struct Config { debug: bool }
//!
//! #[derive(Autowire)]
//! struct RequestId;
//!
//! let container = Container::new();
//!
//! // Singleton - created on first use, shared everywhere
//! container.singleton(|| Arc::new(Config { debug: true }));
//!
//! // Instance - fresh for every top-level get/resolve/fill/call
//! container.instance(|| Arc::new(RequestId));
//!
//! let a = container.get::<Arc<RequestId>>().unwrap();
//! let b = container.get::<Arc<RequestId>>().unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Interfaces
//!
//! Traits bound as `Arc<dyn Trait>` need `Autowire` as a supertrait so the
//! container can wire the concrete value behind them.
//!
//! ```rust
//! use graph_injector::{Autowire, Container};
//! use std::sync::Arc;
//!
//! trait Shape: Autowire {
//!     fn area(&self) -> u32;
//! }
//!
//! #[derive(Autowire)]
//! struct Circle { a: u32 }
//!
//! impl Shape for Circle {
//!     fn area(&self) -> u32 { self.a }
//! }
//!
//! let container = Container::new();
//! container.named_singleton("theCircle", || -> Arc<dyn Shape> { Arc::new(Circle { a: 13 }) });
//!
//! let mut shape: Option<Arc<dyn Shape>> = None;
//! container.named_resolve(&mut shape, "theCircle");
//! assert_eq!(shape.unwrap().area(), 13);
//! ```
//!
//! ## Memory
//!
//! Instances are reference counted. A cyclic graph (A holds B holds A) keeps
//! itself alive until one of its edges is cleared with [`Inject::take`].

// Lets `#[derive(Autowire)]` output refer to `::graph_injector` inside this crate
extern crate self as graph_injector;

#[macro_use]
mod tracer;

mod autowire;
mod binding;
mod call;
mod container;
mod context;
mod error;
pub mod global;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;
mod resolver;

pub use autowire::{
    Autowire, Field, INJECT_BY_NAME, INJECT_BY_TYPE, Inject, MAX_UNWRAP_DEPTH, Slot, Target,
};
pub use call::Callable;
pub use container::{Container, ErrorHandler};
pub use error::*;
pub use global::global;
pub use provider::{
    Declared, Erased, IntoProvider, Kind, Lifetime, Outcome, Provider, ProviderId, ProviderOutput,
    Signature, TypeInfo,
};

#[cfg(feature = "derive")]
pub use graph_injector_derive::Autowire;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Autowire, Container, DiError, Field, Inject, Lifetime, Result, Target, global,
    };
    pub use std::sync::Arc;
}

#[cfg(all(test, feature = "derive"))]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    fn strict() -> Container {
        let container = Container::new();
        container.set_error_handler(|err| panic!("unexpected error: {err}"));
        container
    }

    fn collecting() -> (Container, Arc<Mutex<Vec<DiError>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let container = Container::new();
        container.set_error_handler(move |err| sink.lock().unwrap().push(err));
        (container, errors)
    }

    // =========================================================================
    // Shapes
    // =========================================================================

    trait Shape: Autowire {
        fn set_area(&self, a: i32);
        fn area(&self) -> i32;
    }

    #[derive(Autowire)]
    struct Circle {
        a: AtomicI32,
    }

    impl Circle {
        fn new(a: i32) -> Self {
            Self { a: AtomicI32::new(a) }
        }
    }

    impl Shape for Circle {
        fn set_area(&self, a: i32) {
            self.a.store(a, Ordering::SeqCst);
        }

        fn area(&self) -> i32 {
            self.a.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_singleton_shape_is_shared() {
        let container = strict();
        container.singleton(|| -> Arc<dyn Shape> { Arc::new(Circle::new(13)) });

        let first = container.get::<Arc<dyn Shape>>().unwrap();
        assert_eq!(first.area(), 13);

        let second = container.get::<Arc<dyn Shape>>().unwrap();
        first.set_area(42);
        assert_eq!(second.area(), 42);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_instance_shapes_are_distinct() {
        let container = strict();
        container.instance(|| -> Arc<dyn Shape> { Arc::new(Circle::new(13)) });

        let first = container.get::<Arc<dyn Shape>>().unwrap();
        let second = container.get::<Arc<dyn Shape>>().unwrap();
        first.set_area(42);

        assert_eq!(second.area(), 13);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_named_resolve_shape() {
        let container = strict();
        container.named_singleton("theCircle", || -> Arc<dyn Shape> {
            Arc::new(Circle::new(13))
        });

        let mut shape: Option<Arc<dyn Shape>> = None;
        container.named_resolve(&mut shape, "theCircle");
        assert_eq!(shape.unwrap().area(), 13);
    }

    // =========================================================================
    // Cycles
    // =========================================================================

    #[derive(Autowire)]
    struct John {
        val: i32,
    }

    #[derive(Autowire, Default)]
    struct Alice {
        #[di = "type"]
        bob: Inject<Bob>,
        #[di = "type"]
        john: Inject<John>,
    }

    #[derive(Autowire, Default)]
    struct Bob {
        #[di = "type"]
        alice: Inject<Alice>,
        #[di = "type"]
        john: Inject<John>,
    }

    fn walk_five_levels(alice: &Arc<Alice>) {
        let mut current = Arc::clone(alice);
        for _ in 0..5 {
            assert_eq!(current.john.get().unwrap().val, 42);
            let bob = current.bob.get().unwrap();
            assert_eq!(bob.john.get().unwrap().val, 42);
            current = bob.alice.get().unwrap();
        }
    }

    #[test]
    fn test_circular_dependencies_for_every_lifetime_mix() {
        let lifetimes = [Lifetime::Singleton, Lifetime::Instance];
        for alice_lifetime in lifetimes {
            for bob_lifetime in lifetimes {
                let container = strict();
                container
                    .try_bind(|| Arc::new(Alice::default()), "", alice_lifetime)
                    .unwrap();
                container
                    .try_bind(|| Arc::new(Bob::default()), "", bob_lifetime)
                    .unwrap();
                container.singleton(|| Arc::new(John { val: 42 }));

                let alice = container.get::<Arc<Alice>>().unwrap();
                walk_five_levels(&alice);

                // Within one call every holder sees the same Alice
                let bob = alice.bob.get().unwrap();
                assert!(Arc::ptr_eq(&bob.alice.get().unwrap(), &alice));

                bob.alice.take();
            }
        }
    }

    #[test]
    fn test_circular_dependencies_through_call() {
        let container = strict();
        container
            .singleton(|| Arc::new(Alice::default()))
            .instance(|| Arc::new(Bob::default()))
            .singleton(|| Arc::new(John { val: 42 }));

        let mut seen = None;
        container.call(|alice: Arc<Alice>, bob: Arc<Bob>| {
            walk_five_levels(&alice);
            // Shared context across the arguments of one call
            assert!(Arc::ptr_eq(&alice.bob.get().unwrap(), &bob));
            seen = Some(alice);
        });

        let alice = seen.unwrap();
        if let Some(bob) = alice.bob.get() {
            bob.alice.take();
        }
    }

    #[derive(Autowire)]
    struct Partner {
        name: String,
        #[di = "type"]
        robert: Inject<Robert>,
    }

    impl Partner {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_owned(),
                robert: Inject::empty(),
            }
        }
    }

    #[derive(Autowire, Default)]
    struct Robert {
        #[di = "name"]
        dale: Inject<Partner>,
        #[di = "name"]
        peter: Inject<Partner>,
    }

    #[test]
    fn test_named_bindings_resolve_recursively() {
        let lifetimes = [Lifetime::Singleton, Lifetime::Instance];
        for dale_lifetime in lifetimes {
            for peter_lifetime in lifetimes {
                let container = strict();
                container
                    .try_bind(|| Arc::new(Partner::new("dale")), "dale", dale_lifetime)
                    .unwrap();
                container
                    .try_bind(|| Arc::new(Partner::new("peter")), "peter", peter_lifetime)
                    .unwrap();
                container.singleton(|| Arc::new(Robert::default()));

                let robert = container.get::<Arc<Robert>>().unwrap();
                let dale = robert.dale.get().unwrap();
                let peter = robert.peter.get().unwrap();
                assert_eq!(dale.name, "dale");
                assert_eq!(peter.name, "peter");

                let via_dale = dale.robert.get().unwrap();
                assert!(Arc::ptr_eq(&via_dale, &robert));
                assert_eq!(via_dale.peter.get().unwrap().name, "peter");
                assert_eq!(peter.robert.get().unwrap().dale.get().unwrap().name, "dale");

                robert.dale.take();
                robert.peter.take();
            }
        }
    }

    // =========================================================================
    // Fill
    // =========================================================================

    trait Parent: Autowire {
        fn a(&self) -> Option<Arc<A>>;
    }

    #[derive(Autowire, Default)]
    struct ParentImpl {
        #[di = "type"]
        a: Inject<A>,
    }

    impl Parent for ParentImpl {
        fn a(&self) -> Option<Arc<A>> {
            self.a.get()
        }
    }

    #[derive(Autowire, Default)]
    struct A {
        #[di = "type"]
        b: Inject<B>,
    }

    #[derive(Autowire, Default)]
    struct B {
        #[di = "type"]
        c: Inject<C>,
    }

    #[derive(Autowire)]
    struct C {
        val: i32,
    }

    #[test]
    fn test_fill_recursively_through_interface() {
        let container = strict();
        container
            .singleton(|| -> Arc<dyn Parent> { Arc::new(ParentImpl::default()) })
            .singleton(|| Arc::new(A::default()))
            .singleton(|| Arc::new(B::default()))
            .singleton(|| Arc::new(C { val: 123 }));

        let parent = container.get::<Arc<dyn Parent>>().unwrap();
        let a = parent.a().unwrap();
        assert_eq!(a.b.get().unwrap().c.get().unwrap().val, 123);

        let direct = container.get::<Arc<A>>().unwrap();
        assert!(Arc::ptr_eq(&a, &direct));
    }

    #[derive(Autowire)]
    struct N {
        val: i32,
    }

    #[derive(Autowire, Default)]
    struct S {
        #[di = "type"]
        nested: Inject<N>,
    }

    #[test]
    fn test_fill_instance_per_call() {
        let container = strict();
        container.instance(|| Arc::new(N { val: 42 }));

        let first = S::default();
        container.fill(&first);
        let second = S::default();
        container.fill(&Box::new(&second));

        let first = first.nested.get().unwrap();
        let second = second.nested.get().unwrap();
        assert_eq!(first.val, 42);
        assert_eq!(second.val, 42);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_fill_singleton_shared_across_calls() {
        let container = strict();
        container.singleton(|| Arc::new(N { val: 42 }));

        let first = S::default();
        let second = S::default();
        container.fill(&first);
        container.fill(&second);

        assert!(Arc::ptr_eq(
            &first.nested.get().unwrap(),
            &second.nested.get().unwrap()
        ));
    }

    mod private {
        use super::*;

        #[derive(Autowire, Default)]
        pub struct Hidden {
            #[di = "type"]
            secret: Inject<N>,
        }

        impl Hidden {
            pub fn secret(&self) -> Option<i32> {
                self.secret.get().map(|n| n.val)
            }
        }
    }

    #[test]
    fn test_fill_private_fields() {
        let container = strict();
        container.instance(|| Arc::new(N { val: 7 }));

        let hidden = private::Hidden::default();
        container.fill(&hidden);
        assert_eq!(hidden.secret(), Some(7));
    }

    #[derive(Autowire, Default)]
    struct Tagged {
        #[di = "type"]
        first: Inject<N>,
        #[di = "by-type"]
        second: Inject<N>,
    }

    #[test]
    fn test_fill_invalid_tag_and_targets() {
        let (container, errors) = collecting();
        container.instance(|| Arc::new(N { val: 1 }));

        let tagged = Tagged::default();
        container.fill(&tagged);
        assert!(tagged.first.is_wired());
        assert!(!tagged.second.is_wired());

        let nothing: Option<S> = None;
        container.fill(&nothing);
        container.fill(&5_u64);

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors[0],
            DiError::InvalidTag {
                field: "second",
                tag: "by-type"
            }
        ));
        assert!(matches!(errors[1], DiError::InvalidFillTarget { .. }));
        assert!(matches!(errors[2], DiError::InvalidFillTarget { .. }));
    }

    #[derive(Autowire, Default)]
    struct EmptyTag {
        #[di = ""]
        nested: Inject<N>,
    }

    #[test]
    fn test_fill_rejects_empty_tag() {
        let container = Container::new();
        container.instance(|| Arc::new(N { val: 9 }));

        let value = EmptyTag::default();
        let err = container.try_fill(&value).unwrap_err();

        assert!(matches!(
            err,
            DiError::InvalidTag {
                field: "nested",
                tag: ""
            }
        ));
        assert!(!value.nested.is_wired());
    }

    #[test]
    fn test_fill_without_binding_names_the_field() {
        let container = Container::new();
        let err = container.try_fill(&S::default()).unwrap_err();
        assert!(err.to_string().contains("field `nested`"), "{err}");
        assert!(matches!(err.root_cause(), DiError::NotFound { .. }));
    }

    // =========================================================================
    // Registration and lookup
    // =========================================================================

    #[derive(Debug)]
    struct ConnectionRefused;

    impl std::fmt::Display for ConnectionRefused {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl std::error::Error for ConnectionRefused {}

    trait Database: Autowire {
        fn connect(&self) -> bool;
    }

    #[derive(Autowire, Debug)]
    struct MySql;

    impl Database for MySql {
        fn connect(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_provider_error_is_reported_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let (container, errors) = collecting();
        container.singleton(move || -> std::result::Result<Arc<dyn Database>, ConnectionRefused> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ConnectionRefused)
            } else {
                Ok(Arc::new(MySql))
            }
        });

        assert!(container.get::<Arc<dyn Database>>().is_none());
        assert!(container.get::<Arc<dyn Database>>().unwrap().connect());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("connection refused"));
    }

    #[test]
    fn test_nil_singleton_can_be_rebound() {
        let container = Container::new();
        container.singleton(|| -> Option<Arc<dyn Database>> { None });

        let result = container.try_get::<Arc<dyn Database>>();
        assert!(matches!(result, Err(DiError::NilProviderResult { .. })));

        container.singleton(|| -> Option<Arc<dyn Database>> { Some(Arc::new(MySql)) });
        assert!(container.try_get::<Arc<dyn Database>>().is_ok());
    }

    #[test]
    fn test_invalid_registrations_leave_registry_unchanged() {
        let (container, errors) = collecting();
        container
            .singleton(|| ())
            .singleton(|| 13_i32)
            .singleton(|| C { val: 1 })
            .instance(|db: Arc<dyn Database>| db)
            .singleton(|| (Arc::new(MySql), Arc::new(MySql)));

        assert!(container.is_empty());
        assert_eq!(errors.lock().unwrap().len(), 5);
        assert!(errors.lock().unwrap().iter().all(|err| matches!(
            err,
            DiError::InvalidProviderSignature { .. }
        )));

        let err = container.try_get::<Arc<MySql>>().unwrap_err();
        assert!(matches!(err, DiError::NotFound { .. }));
    }

    #[test]
    fn test_exact_key_matching() {
        let container = Container::new();
        container.named_instance("x", || Arc::new(C { val: 1 }));

        assert!(container.try_named_get::<Arc<C>>("x").is_ok());
        assert!(container.try_get::<Arc<C>>().is_err());
        assert!(container.try_named_get::<Arc<C>>("y").is_err());
    }

    #[test]
    fn test_resolve_by_value_is_diagnosed() {
        let container = Container::new();
        container.singleton(|| Arc::new(C { val: 1 }));

        let mut by_value = C { val: 0 };
        let err = container.try_resolve(&mut by_value).unwrap_err();
        assert!(matches!(err, DiError::PassedByValue { .. }), "{err}");

        let mut unbound = N { val: 0 };
        let err = container.try_resolve(&mut unbound).unwrap_err();
        assert!(matches!(err, DiError::NotFound { .. }));

        let mut by_reference = Arc::new(C { val: 0 });
        container.try_resolve(&mut by_reference).unwrap();
        assert_eq!(by_reference.val, 1);
    }

    #[test]
    fn test_call_with_unbound_second_argument() {
        let (container, errors) = collecting();
        container.singleton(|| Arc::new(C { val: 1 }));

        let mut called = false;
        container.call(|_c: Arc<C>, _n: Arc<N>| called = true);

        assert!(!called);
        let errors = errors.lock().unwrap();
        assert!(matches!(errors[0], DiError::NotFound { .. }));
    }

    #[test]
    fn test_call_rejects_by_value_receivers() {
        let container = Container::new();
        let err = container.try_call(|_c: C| {}).unwrap_err();
        assert!(matches!(err, DiError::InvalidCallReceiver { position: 0, .. }));
    }

    #[test]
    fn test_reset() {
        let container = strict();
        container
            .singleton(|| Arc::new(C { val: 1 }))
            .named_instance("n", || Arc::new(N { val: 2 }));
        assert_eq!(container.len(), 2);

        container.reset();
        assert!(container.is_empty());
        assert!(container.try_get::<Arc<C>>().is_err());
    }

    #[test]
    fn test_provider_may_use_the_container() {
        let container = strict();
        let inner = container.clone();
        container
            .singleton(|| Arc::new(N { val: 5 }))
            .instance(move || {
                // A nested top-level call with its own context
                let n = inner.get::<Arc<N>>().unwrap();
                Arc::new(C { val: n.val * 2 })
            });

        assert_eq!(container.get::<Arc<C>>().unwrap().val, 10);
    }
}
