//! Provider signatures and declared types
//!
//! A provider is any zero-argument closure whose return type is a
//! [`ProviderOutput`]. Every type that can cross the container boundary
//! implements [`Declared`], which tells the registry the type's identity and
//! its kind (pointer/interface, struct, scalar or error). Registration checks
//! the signature at runtime so that argument-taking or value-returning
//! providers are rejected with [`DiError::InvalidProviderSignature`] instead of
//! being silently accepted.

use crate::autowire::Target;
use crate::{Autowire, DiError, ProviderError, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A resolved instance with its concrete `Arc<T>` type erased.
///
/// The box always holds the declared reference type (`Arc<T>`), so identity
/// comparisons go through the inner `Arc`, not this one.
pub type Erased = Arc<dyn Any + Send + Sync>;

/// Type-erased wiring entry point captured at registration.
pub(crate) type TargetFn = for<'a> fn(&'a Erased) -> Option<Target<'a>>;

/// Shape of a declared type, as far as injection is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `Arc<T>` for a struct or a trait object
    Reference,
    /// A struct held by value
    Struct,
    /// A scalar held by value
    Value,
    /// The error half of a fallible provider
    Error,
}

impl Kind {
    /// Whether instances of this kind can be shared and wired after creation
    #[inline]
    pub fn is_reference(self) -> bool {
        matches!(self, Kind::Reference)
    }
}

/// Identity and kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    reference: Option<TypeId>,
}

impl TypeInfo {
    /// Info for `Arc<T>`. The binding key is the `Arc` itself, the name is the pointee's.
    #[inline]
    pub fn reference<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<Arc<T>>(),
            name: std::any::type_name::<T>(),
            kind: Kind::Reference,
            reference: None,
        }
    }

    /// Info for a struct held by value.
    #[inline]
    pub fn structure<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: Kind::Struct,
            reference: Some(TypeId::of::<Arc<T>>()),
        }
    }

    /// Info for a scalar held by value.
    #[inline]
    pub fn value<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: Kind::Value,
            reference: Some(TypeId::of::<Arc<T>>()),
        }
    }

    /// Info for the error type of a fallible provider.
    #[inline]
    pub fn error<E: 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            kind: Kind::Error,
            reference: None,
        }
    }

    /// Binding key of this type
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name (the pointee's name for references)
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Key of `Arc<Self>` for by-value types.
    #[inline]
    pub fn reference_id(&self) -> Option<TypeId> {
        self.reference
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Reference => write!(f, "Arc<{}>", self.name),
            _ => f.write_str(self.name),
        }
    }
}

/// A type that can be produced by a provider, requested from the container,
/// or received by a [`Callable`](crate::Callable).
///
/// Implemented for `Arc<T>` and `Option<Arc<T>>` (the reference kinds), for
/// the scalar primitives and `String` (the value kind), and by
/// `#[derive(Autowire)]` for the deriving struct (the struct kind). Only the
/// reference kinds carry instances; the by-value impls exist so that misuse
/// is reported with a precise error instead of a missing binding.
pub trait Declared: Sized + 'static {
    /// Identity and kind of this type
    fn declared() -> TypeInfo;

    /// Erase a produced value. `None` means "nil".
    fn into_erased(self) -> Option<Erased> {
        None
    }

    /// Recover a value from a resolved instance.
    fn from_erased(_value: &Erased) -> Option<Self> {
        None
    }

    /// Injection descriptor of the instance behind `value`, if it has one.
    fn target_of(_value: &Erased) -> Option<Target<'_>> {
        None
    }
}

impl<T: ?Sized + Autowire + 'static> Declared for Arc<T> {
    #[inline]
    fn declared() -> TypeInfo {
        TypeInfo::reference::<T>()
    }

    #[inline]
    fn into_erased(self) -> Option<Erased> {
        Some(Arc::new(self) as Erased)
    }

    #[inline]
    fn from_erased(value: &Erased) -> Option<Self> {
        value.downcast_ref::<Arc<T>>().cloned()
    }

    fn target_of(value: &Erased) -> Option<Target<'_>> {
        value
            .downcast_ref::<Arc<T>>()
            .map(|instance| Autowire::target(&**instance))
    }
}

impl<T: ?Sized + Autowire + 'static> Declared for Option<Arc<T>> {
    #[inline]
    fn declared() -> TypeInfo {
        TypeInfo::reference::<T>()
    }

    #[inline]
    fn into_erased(self) -> Option<Erased> {
        self.and_then(Declared::into_erased)
    }

    #[inline]
    fn from_erased(value: &Erased) -> Option<Self> {
        <Arc<T> as Declared>::from_erased(value).map(Some)
    }

    fn target_of(value: &Erased) -> Option<Target<'_>> {
        <Arc<T> as Declared>::target_of(value)
    }
}

macro_rules! declare_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Declared for $ty {
                #[inline]
                fn declared() -> TypeInfo {
                    TypeInfo::value::<$ty>()
                }
            }
        )*
    };
}

declare_values!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// Result of invoking a provider
pub enum Outcome {
    /// A live instance
    Value(Erased),
    /// The provider returned nil (`None`)
    Nil,
    /// The provider returned an error
    Failed(ProviderError),
}

/// The return type of a provider closure.
///
/// Implemented for every [`Declared`] type (one output), for
/// `Result<D, E>` (two outputs, the second being the error kind), and for
/// `()` and tuples so that their signatures can be rejected with a precise
/// message at registration.
pub trait ProviderOutput: 'static {
    /// Declared output types, in order
    fn outputs() -> Vec<TypeInfo>;

    /// Convert the returned value into an [`Outcome`]
    fn into_outcome(self) -> Outcome;

    /// Injection descriptor of an instance produced by this output
    fn target_of(_value: &Erased) -> Option<Target<'_>> {
        None
    }
}

impl<D: Declared> ProviderOutput for D {
    fn outputs() -> Vec<TypeInfo> {
        vec![D::declared()]
    }

    #[inline]
    fn into_outcome(self) -> Outcome {
        match self.into_erased() {
            Some(value) => Outcome::Value(value),
            None => Outcome::Nil,
        }
    }

    #[inline]
    fn target_of(value: &Erased) -> Option<Target<'_>> {
        <D as Declared>::target_of(value)
    }
}

impl<D, E> ProviderOutput for std::result::Result<D, E>
where
    D: Declared,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    fn outputs() -> Vec<TypeInfo> {
        vec![D::declared(), TypeInfo::error::<E>()]
    }

    #[inline]
    fn into_outcome(self) -> Outcome {
        // The first output is discarded whenever an error is present
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => {
                let err: Box<dyn std::error::Error + Send + Sync> = err.into();
                Outcome::Failed(Arc::from(err))
            }
        }
    }

    #[inline]
    fn target_of(value: &Erased) -> Option<Target<'_>> {
        <D as Declared>::target_of(value)
    }
}

impl ProviderOutput for () {
    fn outputs() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn into_outcome(self) -> Outcome {
        Outcome::Nil
    }
}

impl<A: Declared, B: Declared> ProviderOutput for (A, B) {
    fn outputs() -> Vec<TypeInfo> {
        vec![A::declared(), B::declared()]
    }

    fn into_outcome(self) -> Outcome {
        self.0.into_outcome()
    }

    fn target_of(value: &Erased) -> Option<Target<'_>> {
        <A as Declared>::target_of(value)
    }
}

impl<A: Declared, B: Declared, C: Declared> ProviderOutput for (A, B, C) {
    fn outputs() -> Vec<TypeInfo> {
        vec![A::declared(), B::declared(), C::declared()]
    }

    fn into_outcome(self) -> Outcome {
        self.0.into_outcome()
    }

    fn target_of(value: &Erased) -> Option<Target<'_>> {
        <A as Declared>::target_of(value)
    }
}

/// Parameter and return types of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<&'static str>,
    outputs: Vec<TypeInfo>,
}

impl Signature {
    #[inline]
    pub fn new(params: Vec<&'static str>, outputs: Vec<TypeInfo>) -> Self {
        Self { params, outputs }
    }

    #[inline]
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    #[inline]
    pub fn outputs(&self) -> &[TypeInfo] {
        &self.outputs
    }

    /// The primary output (the type the provider is bound under)
    #[inline]
    pub fn primary(&self) -> Option<&TypeInfo> {
        self.outputs.first()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({})", self.params.join(", "))?;
        match self.outputs.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {single}"),
            many => {
                f.write_str(" -> (")?;
                for (i, output) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{output}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Identity of a registered provider, stable for the provider's lifetime.
///
/// Bindings created from the same registration share it, which is what the
/// resolution context keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

impl ProviderId {
    #[inline]
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider-{}", self.0)
    }
}

/// Type-erased provider invocation
type InvokeFn = Box<dyn Fn() -> Outcome + Send + Sync>;

/// A registered factory together with its signature.
pub struct Provider {
    id: ProviderId,
    signature: Signature,
    /// Absent for closures that take parameters; those never pass validation.
    invoke: Option<InvokeFn>,
    target: TargetFn,
}

impl Provider {
    pub(crate) fn new(signature: Signature, invoke: Option<InvokeFn>, target: TargetFn) -> Self {
        Self {
            id: ProviderId::next(),
            signature,
            invoke,
            target,
        }
    }

    #[inline]
    pub fn id(&self) -> ProviderId {
        self.id
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Check the signature against the provider contract.
    pub(crate) fn validate(&self) -> Result<()> {
        let signature = &self.signature;
        if !signature.params.is_empty() {
            return Err(DiError::invalid_signature(
                signature,
                "arguments are not permitted to providers",
            ));
        }

        match signature.outputs.as_slice() {
            [first] | [first, _] if !first.kind().is_reference() => Err(
                DiError::invalid_signature(signature, "must return a pointer or interface type"),
            ),
            [_, second] if second.kind() != Kind::Error => Err(DiError::invalid_signature(
                signature,
                "the second return value must be an error",
            )),
            [_] | [_, _] => Ok(()),
            _ => Err(DiError::invalid_signature(
                signature,
                "must return one or two values",
            )),
        }
    }

    /// Types this provider is bound under: the primary output, then the
    /// error output when present and distinct.
    pub(crate) fn keys(&self) -> Vec<TypeInfo> {
        let mut keys: Vec<TypeInfo> = Vec::with_capacity(2);
        for output in &self.signature.outputs {
            if keys.iter().all(|key| key.id() != output.id()) {
                keys.push(*output);
            }
        }
        keys
    }

    /// Invoke with no arguments
    #[inline]
    pub(crate) fn call(&self) -> Outcome {
        match &self.invoke {
            Some(invoke) => invoke(),
            None => Outcome::Nil,
        }
    }

    /// Injection descriptor of an instance this provider produced
    #[inline]
    pub(crate) fn target<'a>(&self, value: &'a Erased) -> Option<Target<'a>> {
        (self.target)(value)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Conversion of a closure into a [`Provider`].
///
/// The `Marker` parameter only disambiguates closure arities; it is inferred.
pub trait IntoProvider<Marker>: Send + Sync + 'static {
    fn into_provider(self) -> Provider;
}

impl<F, R> IntoProvider<fn() -> R> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: ProviderOutput,
{
    fn into_provider(self) -> Provider {
        Provider::new(
            Signature::new(Vec::new(), R::outputs()),
            Some(Box::new(move || self().into_outcome())),
            R::target_of,
        )
    }
}

// Argument-taking closures are accepted here so that registration can reject
// them with a descriptive error.
macro_rules! impl_into_provider_with_params {
    ($($param:ident),+) => {
        impl<F, R, $($param: 'static),+> IntoProvider<fn($($param),+) -> R> for F
        where
            F: Fn($($param),+) -> R + Send + Sync + 'static,
            R: ProviderOutput,
        {
            fn into_provider(self) -> Provider {
                Provider::new(
                    Signature::new(vec![$(std::any::type_name::<$param>()),+], R::outputs()),
                    None,
                    R::target_of,
                )
            }
        }
    };
}

impl_into_provider_with_params!(P1);
impl_into_provider_with_params!(P1, P2);
impl_into_provider_with_params!(P1, P2, P3);
impl_into_provider_with_params!(P1, P2, P3, P4);

/// Service lifetime specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Provider runs at most once per container; the instance is shared
    #[default]
    Singleton,

    /// Provider runs once per top-level resolution
    Instance,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Instance => "instance",
        })
    }
}
