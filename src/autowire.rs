//! Field auto-wiring
//!
//! A type takes part in auto-wiring by implementing [`Autowire`], which
//! describes the value as a [`Target`]: a struct with a table of injectable
//! [`Field`]s, one pointer/interface hop to another wireable value, or a plain
//! scalar. `#[derive(Autowire)]` generates the table from `#[di = "type"]` and
//! `#[di = "name"]` attributes; writing the impl by hand is equally valid.
//!
//! Injectable fields are [`Inject<T>`] slots. A slot is written through a
//! shared reference, so an instance that is already shared (a singleton, or
//! a node of a cyclic graph) can still be wired after it was allocated. The
//! impl lives next to the struct, which is what makes private fields valid
//! injection targets.
//!
//! ## Example
//!
//! ```rust
//! use graph_injector::{Autowire, Container, Field, Inject, Target};
//! use std::sync::Arc;
//!
//! struct Engine;
//!
//! impl Autowire for Engine {
//!     fn target(&self) -> Target<'_> {
//!         Target::structure("Engine", Vec::new())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Car {
//!     engine: Inject<Engine>,
//! }
//!
//! impl Autowire for Car {
//!     fn target(&self) -> Target<'_> {
//!         Target::structure("Car", vec![Field::new("engine", "type", &self.engine)])
//!     }
//! }
//!
//! let container = Container::new();
//! container.singleton(|| Arc::new(Engine));
//!
//! let car = Car::default();
//! container.fill(&car);
//! assert!(car.engine.is_wired());
//! ```

use crate::context::ResolutionContext;
use crate::provider::{Declared, Erased, TypeInfo};
use crate::resolver::Resolver;
use crate::{DiError, Result};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Number of pointer/interface hops fill follows before giving up
pub const MAX_UNWRAP_DEPTH: usize = 4;

/// Injection tag: resolve by the field's declared type under the default name
pub const INJECT_BY_TYPE: &str = "type";

/// Injection tag: resolve by the field's declared type under the field's identifier
pub const INJECT_BY_NAME: &str = "name";

/// A value the container can wire.
///
/// Traits used as `Arc<dyn Trait>` bindings must have `Autowire` as a
/// supertrait so that provided instances can be reached and wired.
pub trait Autowire: Send + Sync {
    /// Describe this value for the fill routine
    fn target(&self) -> Target<'_>;
}

/// What a wireable value looks like to the fill routine.
pub enum Target<'a> {
    /// A struct and its field table
    Struct {
        name: &'static str,
        fields: Vec<Field<'a>>,
    },
    /// One pointer or interface hop; `None` is a nil pointer
    Indirect {
        name: &'static str,
        inner: Option<&'a dyn Autowire>,
    },
    /// A scalar, which has no fields to fill
    Value { name: &'static str },
}

impl<'a> Target<'a> {
    /// A struct with the given field table
    #[inline]
    pub fn structure(name: &'static str, fields: Vec<Field<'a>>) -> Self {
        Target::Struct { name, fields }
    }

    /// A hop to another wireable value
    #[inline]
    pub fn indirect(name: &'static str, inner: Option<&'a dyn Autowire>) -> Self {
        Target::Indirect { name, inner }
    }

    #[inline]
    pub fn value(name: &'static str) -> Self {
        Target::Value { name }
    }

    /// Type name of the described value
    pub fn type_name(&self) -> &'static str {
        match self {
            Target::Struct { name, .. } | Target::Indirect { name, .. } | Target::Value { name } => {
                name
            }
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Struct { name, fields } => f
                .debug_struct("Struct")
                .field("name", name)
                .field("fields", fields)
                .finish(),
            Target::Indirect { name, inner } => f
                .debug_struct("Indirect")
                .field("name", name)
                .field("nil", &inner.is_none())
                .finish(),
            Target::Value { name } => f.debug_struct("Value").field("name", name).finish(),
        }
    }
}

/// One entry of a struct's field table.
///
/// Only fields that carry an injection descriptor belong in the table;
/// fields left out of it are never touched by fill. A tag other than
/// [`INJECT_BY_TYPE`] or [`INJECT_BY_NAME`], the empty string included, is
/// rejected when the struct is filled.
pub struct Field<'a> {
    name: &'static str,
    tag: &'static str,
    slot: &'a dyn Slot,
}

impl<'a> Field<'a> {
    #[inline]
    pub fn new(name: &'static str, tag: &'static str, slot: &'a dyn Slot) -> Self {
        Self { name, tag, slot }
    }

    /// Field identifier
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw injection tag as written on the field
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn slot(&self) -> &'a dyn Slot {
        self.slot
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("type", &self.slot.declared().name())
            .finish()
    }
}

/// A writable injection point with a declared type.
pub trait Slot: Send + Sync {
    /// Declared type of the field
    fn declared(&self) -> TypeInfo;

    /// Store a resolved instance. Returns `false` if the instance is not of
    /// the declared type.
    fn assign(&self, value: &Erased) -> bool;
}

/// Injectable field holding a shared `Arc<T>`.
///
/// Starts empty and is written by the container during fill.
pub struct Inject<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Inject<T> {
    /// An empty slot
    #[inline]
    pub const fn empty() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// A slot that already holds `value`
    #[inline]
    pub fn new(value: Arc<T>) -> Self {
        Self {
            slot: RwLock::new(Some(value)),
        }
    }

    /// The injected instance, if the slot has been wired
    #[inline]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[inline]
    pub fn is_wired(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store `value`, returning the previous instance
    #[inline]
    pub fn set(&self, value: Arc<T>) -> Option<Arc<T>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(value)
    }

    /// Empty the slot, returning its instance. Dropping the edges of a cyclic
    /// graph this way lets its nodes be reclaimed.
    #[inline]
    pub fn take(&self) -> Option<Arc<T>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> From<Arc<T>> for Inject<T> {
    fn from(value: Arc<T>) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}

impl<T: ?Sized + Autowire + 'static> Slot for Inject<T> {
    #[inline]
    fn declared(&self) -> TypeInfo {
        TypeInfo::reference::<T>()
    }

    fn assign(&self, value: &Erased) -> bool {
        match <Arc<T> as Declared>::from_erased(value) {
            Some(instance) => {
                self.set(instance);
                true
            }
            None => false,
        }
    }
}

// Wrappers are one hop each. Only sized pointees can be handed on as
// `&dyn Autowire`; trait objects are reached through their own impl.

impl<T: Autowire> Autowire for Arc<T> {
    fn target(&self) -> Target<'_> {
        Target::indirect(std::any::type_name::<Self>(), Some(&**self as &dyn Autowire))
    }
}

impl<T: Autowire> Autowire for Box<T> {
    fn target(&self) -> Target<'_> {
        Target::indirect(std::any::type_name::<Self>(), Some(&**self as &dyn Autowire))
    }
}

impl<T: Autowire> Autowire for &T {
    fn target(&self) -> Target<'_> {
        Target::indirect(std::any::type_name::<Self>(), Some(*self as &dyn Autowire))
    }
}

impl<T: Autowire> Autowire for Option<T> {
    fn target(&self) -> Target<'_> {
        Target::indirect(
            std::any::type_name::<Self>(),
            self.as_ref().map(|inner| inner as &dyn Autowire),
        )
    }
}

macro_rules! autowire_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Autowire for $ty {
                #[inline]
                fn target(&self) -> Target<'_> {
                    Target::value(std::any::type_name::<$ty>())
                }
            }
        )*
    };
}

autowire_values!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl Resolver<'_> {
    /// Populate every tagged field reachable from `target`.
    ///
    /// Stops at the first failing field; fields written before it keep their
    /// values.
    pub(crate) fn fill(&self, target: Target<'_>, ctx: &mut ResolutionContext) -> Result<()> {
        let mut target = target;
        let mut hops = 0;

        let (name, fields) = loop {
            match target {
                Target::Struct { name, fields } => break (name, fields),
                Target::Indirect { name, inner } => {
                    let Some(inner) = inner else {
                        return Err(DiError::InvalidFillTarget {
                            type_name: name,
                            reason: "the pointer or interface is nil",
                        });
                    };
                    hops += 1;
                    if hops > MAX_UNWRAP_DEPTH {
                        return Err(DiError::InvalidFillTarget {
                            type_name: name,
                            reason: "too many levels of indirection",
                        });
                    }
                    target = inner.target();
                }
                Target::Value { name } => {
                    return Err(DiError::InvalidFillTarget {
                        type_name: name,
                        reason: "it is not a struct",
                    });
                }
            }
        };

        debug_event!(
            self.tracer(),
            op = "fill",
            service = name,
            fields = fields.len(),
            depth = ctx.depth(),
            "Filling struct"
        );

        for field in &fields {
            self.fill_field(field, ctx)?;
        }
        Ok(())
    }

    fn fill_field(&self, field: &Field<'_>, ctx: &mut ResolutionContext) -> Result<()> {
        let lookup = match field.tag() {
            INJECT_BY_TYPE => "",
            INJECT_BY_NAME => field.name(),
            tag => {
                return Err(DiError::InvalidTag {
                    field: field.name(),
                    tag,
                });
            }
        };

        let declared = field.slot().declared();
        debug_event!(
            self.tracer(),
            op = "fill_field",
            field = field.name(),
            service = declared.name(),
            name = lookup,
            depth = ctx.depth(),
            "Resolving field"
        );

        let instance = self
            .resolve(&declared, lookup, ctx)
            .map_err(|err| DiError::unresolved_field(field.name(), declared.name(), err))?;

        if field.slot().assign(&instance) {
            Ok(())
        } else {
            Err(DiError::unresolved_field(
                field.name(),
                declared.name(),
                DiError::mismatch(declared.name()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::provider::{IntoProvider, Lifetime};
    use crate::registry::Registry;
    use crate::tracer::Tracer;

    struct Leaf {
        val: i32,
    }

    impl Autowire for Leaf {
        fn target(&self) -> Target<'_> {
            Target::structure("Leaf", Vec::new())
        }
    }

    #[derive(Default)]
    struct Holder {
        by_type: Inject<Leaf>,
        by_name: Inject<Leaf>,
        untouched: Inject<Leaf>,
    }

    impl Autowire for Holder {
        fn target(&self) -> Target<'_> {
            Target::structure(
                "Holder",
                vec![
                    Field::new("by_type", INJECT_BY_TYPE, &self.by_type),
                    Field::new("by_name", INJECT_BY_NAME, &self.by_name),
                ],
            )
        }
    }

    #[derive(Default)]
    struct BadTag {
        first: Inject<Leaf>,
        second: Inject<Leaf>,
    }

    impl Autowire for BadTag {
        fn target(&self) -> Target<'_> {
            Target::structure(
                "BadTag",
                vec![
                    Field::new("first", INJECT_BY_TYPE, &self.first),
                    Field::new("second", "typo", &self.second),
                ],
            )
        }
    }

    fn bind<M>(registry: &Registry, name: &str, lifetime: Lifetime, f: impl IntoProvider<M>) {
        let provider = Arc::new(f.into_provider());
        for key in provider.keys() {
            registry.insert(key, name, Binding::new(Arc::clone(&provider), key, lifetime));
        }
    }

    fn fill(registry: &Registry, target: Target<'_>) -> Result<()> {
        let tracer = Tracer::default();
        let resolver = Resolver::new(registry, &tracer);
        resolver.fill(target, &mut ResolutionContext::new())
    }

    #[test]
    fn test_fill_by_type_and_by_name() {
        let registry = Registry::new();
        bind(&registry, "", Lifetime::Instance, || Arc::new(Leaf { val: 1 }));
        bind(&registry, "by_name", Lifetime::Instance, || Arc::new(Leaf { val: 2 }));

        let holder = Holder::default();
        fill(&registry, holder.target()).unwrap();

        assert_eq!(holder.by_type.get().unwrap().val, 1);
        assert_eq!(holder.by_name.get().unwrap().val, 2);
        assert!(!holder.untouched.is_wired());
    }

    #[test]
    fn test_fill_unwraps_pointers() {
        let registry = Registry::new();
        bind(&registry, "", Lifetime::Instance, || Arc::new(Leaf { val: 1 }));
        bind(&registry, "by_name", Lifetime::Instance, || Arc::new(Leaf { val: 2 }));

        let holder = Arc::new(Box::new(Holder::default()));
        let reference = &holder;
        fill(&registry, Autowire::target(&reference)).unwrap();
        assert!(holder.by_type.is_wired());
    }

    #[test]
    fn test_fill_rejects_deep_nil_and_scalar_targets() {
        let registry = Registry::new();

        let deep = Box::new(Box::new(Box::new(Box::new(Box::new(Holder::default())))));
        let err = fill(&registry, deep.target()).unwrap_err();
        assert!(err.to_string().contains("too many levels"), "{err}");

        let nil: Option<Holder> = None;
        let err = fill(&registry, nil.target()).unwrap_err();
        assert!(matches!(err, DiError::InvalidFillTarget { .. }));

        let err = fill(&registry, 42_i32.target()).unwrap_err();
        assert!(err.to_string().contains("not a struct"), "{err}");
    }

    #[test]
    fn test_invalid_tag_aborts_after_earlier_fields() {
        let registry = Registry::new();
        bind(&registry, "", Lifetime::Instance, || Arc::new(Leaf { val: 7 }));

        let value = BadTag::default();
        let err = fill(&registry, value.target()).unwrap_err();

        match err {
            DiError::InvalidTag { field, tag } => {
                assert_eq!(field, "second");
                assert_eq!(tag, "typo");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Not transactional
        assert_eq!(value.first.get().unwrap().val, 7);
        assert!(!value.second.is_wired());
    }

    #[test]
    fn test_empty_tag_is_invalid() {
        struct EmptyTag {
            leaf: Inject<Leaf>,
        }

        impl Autowire for EmptyTag {
            fn target(&self) -> Target<'_> {
                Target::structure("EmptyTag", vec![Field::new("leaf", "", &self.leaf)])
            }
        }

        let registry = Registry::new();
        bind(&registry, "", Lifetime::Instance, || Arc::new(Leaf { val: 3 }));

        let value = EmptyTag {
            leaf: Inject::empty(),
        };
        let err = fill(&registry, value.target()).unwrap_err();

        assert!(matches!(err, DiError::InvalidTag { field: "leaf", tag: "" }));
        assert!(!value.leaf.is_wired());
    }

    #[test]
    fn test_missing_binding_is_reported_per_field() {
        let registry = Registry::new();
        bind(&registry, "", Lifetime::Instance, || Arc::new(Leaf { val: 1 }));

        let holder = Holder::default();
        let err = fill(&registry, holder.target()).unwrap_err();

        match &err {
            DiError::UnresolvedField { field, .. } => assert_eq!(*field, "by_name"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root_cause(), DiError::NotFound { .. }));
        assert!(holder.by_type.is_wired());
    }

    #[test]
    fn test_inject_slot() {
        let slot: Inject<Leaf> = Inject::empty();
        assert!(slot.get().is_none());

        let first = Arc::new(Leaf { val: 1 });
        assert!(slot.set(Arc::clone(&first)).is_none());
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &first));

        let erased: Erased = Arc::new(Arc::new(Leaf { val: 2 }));
        assert!(slot.assign(&erased));
        assert_eq!(slot.get().unwrap().val, 2);

        let wrong: Erased = Arc::new(Arc::new(5_u8));
        assert!(!slot.assign(&wrong));

        assert!(slot.take().is_some());
        assert!(!slot.is_wired());
        assert!(format!("{slot:?}").contains("wired: false"));
    }
}
