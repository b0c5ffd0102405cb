//! The resolution algorithm
//!
//! `resolve` looks up a binding, reuses an instance already built in the
//! current call when there is one, and otherwise invokes the provider. A new
//! instance is recorded in the context *before* its fields are wired, so a
//! graph that points back at a node under construction gets the same
//! reference and the recursion ends. Singletons run this under their
//! binding's initialization lock and keep the result only if wiring succeeds.

use crate::autowire::Target;
use crate::binding::Binding;
use crate::context::ResolutionContext;
use crate::provider::{Erased, Lifetime, Outcome, TypeInfo};
use crate::registry::Registry;
use crate::tracer::Tracer;
use crate::{DiError, Result};
use std::sync::Arc;

/// Borrowed view of a container used for one top-level call
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'c> {
    registry: &'c Registry,
    tracer: &'c Tracer,
}

impl<'c> Resolver<'c> {
    #[inline]
    pub fn new(registry: &'c Registry, tracer: &'c Tracer) -> Self {
        Self { registry, tracer }
    }

    #[inline]
    pub fn tracer(&self) -> &'c Tracer {
        self.tracer
    }

    /// Produce the instance bound under `(key, name)`.
    pub fn resolve(
        &self,
        key: &TypeInfo,
        name: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<Erased> {
        let binding = self
            .registry
            .get(key.id(), name)
            .ok_or_else(|| DiError::not_found(key.name(), name))?;
        let id = binding.provider().id();

        if let Some(instance) = ctx.get(id, name) {
            debug_event!(
                self.tracer,
                op = "reuse",
                service = key.name(),
                name = name,
                depth = ctx.depth(),
                "Reusing instance created earlier in this call"
            );
            return Ok(Arc::clone(instance));
        }

        debug_event!(
            self.tracer,
            op = "resolve",
            service = key.name(),
            name = name,
            lifetime = %binding.lifetime(),
            depth = ctx.depth(),
            "Resolving binding"
        );

        match binding.lifetime() {
            Lifetime::Instance => self.create(&binding, name, ctx),
            Lifetime::Singleton => {
                if let Some(instance) = binding.cached() {
                    debug_event!(
                        self.tracer,
                        op = "cached",
                        service = key.name(),
                        name = name,
                        depth = ctx.depth(),
                        "Returning cached singleton"
                    );
                    ctx.insert(id, name, instance);
                    return Ok(Arc::clone(instance));
                }

                let instance = binding.get_or_try_init(|| self.create(&binding, name, ctx))?;
                ctx.insert(id, name, instance);
                Ok(Arc::clone(instance))
            }
        }
    }

    /// Invoke the provider, record the instance, then wire it.
    fn create(&self, binding: &Binding, name: &str, ctx: &mut ResolutionContext) -> Result<Erased> {
        let provider = binding.provider();
        let type_name = binding.key().name();

        debug_event!(
            self.tracer,
            op = "invoke",
            service = type_name,
            name = name,
            provider = %provider.id(),
            depth = ctx.depth(),
            "Invoking provider"
        );

        let instance = match provider.call() {
            Outcome::Value(instance) => instance,
            Outcome::Nil => return Err(DiError::NilProviderResult { type_name }),
            Outcome::Failed(source) => {
                return Err(DiError::ProviderReturnedError { type_name, source });
            }
        };

        ctx.insert(provider.id(), name, &instance);

        match provider.target(&instance) {
            // Scalars behind a pointer have nothing to wire
            None | Some(Target::Value { .. }) => {}
            Some(target) => {
                ctx.enter();
                let wired = self.fill(target, ctx);
                ctx.leave();
                wired?;
            }
        }

        Ok(instance)
    }
}
