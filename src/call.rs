//! Invoking closures with injected arguments
//!
//! Any `FnOnce` of up to six [`Declared`] parameters is a [`Callable`]. Every
//! parameter is resolved under the default name within one shared resolution
//! context, then the closure runs and its return value is dropped.

use crate::context::ResolutionContext;
use crate::provider::{Declared, Erased, TypeInfo};
use crate::resolver::Resolver;
use crate::{DiError, Result};

/// A closure the container can call with resolved arguments.
///
/// The `Marker` parameter only disambiguates arities; it is inferred.
pub trait Callable<Marker> {
    /// Declared parameter types, in order
    fn parameters() -> Vec<TypeInfo>;

    /// Run the closure with one resolved instance per parameter
    fn invoke(self, args: Vec<Erased>) -> Result<()>;
}

macro_rules! impl_callable {
    ($($param:ident $arg:ident),*) => {
        impl<F, R, $($param: Declared),*> Callable<fn($($param),*) -> R> for F
        where
            F: FnOnce($($param),*) -> R,
        {
            fn parameters() -> Vec<TypeInfo> {
                vec![$($param::declared()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(self, args: Vec<Erased>) -> Result<()> {
                let mut args = args.into_iter();
                $(
                    let $arg = args
                        .next()
                        .and_then(|value| $param::from_erased(&value))
                        .ok_or_else(|| DiError::mismatch(std::any::type_name::<$param>()))?;
                )*
                let _ = self($($arg),*);
                Ok(())
            }
        }
    };
}

impl_callable!();
impl_callable!(P1 p1);
impl_callable!(P1 p1, P2 p2);
impl_callable!(P1 p1, P2 p2, P3 p3);
impl_callable!(P1 p1, P2 p2, P3 p3, P4 p4);
impl_callable!(P1 p1, P2 p2, P3 p3, P4 p4, P5 p5);
impl_callable!(P1 p1, P2 p2, P3 p3, P4 p4, P5 p5, P6 p6);

impl Resolver<'_> {
    /// Resolve every parameter of `function`, then run it.
    ///
    /// Nothing runs if any parameter fails to resolve.
    pub(crate) fn call<M, F: Callable<M>>(&self, function: F) -> Result<()> {
        let parameters = F::parameters();
        if let Some((position, param)) = parameters
            .iter()
            .enumerate()
            .find(|(_, param)| !param.kind().is_reference())
        {
            return Err(DiError::InvalidCallReceiver {
                type_name: param.name(),
                position,
            });
        }

        debug_event!(
            self.tracer(),
            op = "call",
            arguments = parameters.len(),
            "Resolving callable arguments"
        );

        let mut ctx = ResolutionContext::new();
        let args = parameters
            .iter()
            .map(|param| self.resolve(param, "", &mut ctx))
            .collect::<Result<Vec<_>>>()?;

        function.invoke(args)
    }
}
