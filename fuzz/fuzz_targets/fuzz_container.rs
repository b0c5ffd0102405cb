#![no_main]

//! Fuzz target for container operations
//!
//! Drives registration, lookup, fill and reset in arbitrary order over a
//! small graph with a cycle.

use arbitrary::Arbitrary;
use graph_injector::{Autowire, Container, DiError, Inject, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Autowire)]
struct Leaf {
    id: u32,
}

#[derive(Autowire, Default)]
struct Left {
    #[di = "type"]
    right: Inject<Right>,
    #[di = "name"]
    leaf: Inject<Leaf>,
}

#[derive(Autowire, Default)]
struct Right {
    #[di = "type"]
    left: Inject<Left>,
}

/// Operations to perform on the container
#[derive(Debug, Arbitrary)]
enum ContainerOp {
    BindLeaf { id: u32, named: bool, singleton: bool },
    BindLeft { singleton: bool },
    BindRight { singleton: bool },
    BindFailing,
    GetLeaf { named: bool },
    GetLeft,
    ResolveRight,
    FillLeft,
    CallPair,
    Reset,
}

fn lifetime(singleton: bool) -> Lifetime {
    if singleton {
        Lifetime::Singleton
    } else {
        Lifetime::Instance
    }
}

fn release(left: &Left) {
    if let Some(right) = left.right.take() {
        right.left.take();
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();
    container.set_error_handler(|_| {});

    for op in ops {
        match op {
            ContainerOp::BindLeaf { id, named, singleton } => {
                let name = if named { "leaf" } else { "" };
                container
                    .try_bind(move || Arc::new(Leaf { id }), name, lifetime(singleton))
                    .unwrap();
                let leaf = container.try_named_get::<Arc<Leaf>>(name).unwrap();
                assert_eq!(leaf.id, id);
            }
            ContainerOp::BindLeft { singleton } => {
                container
                    .try_bind(|| Arc::new(Left::default()), "", lifetime(singleton))
                    .unwrap();
            }
            ContainerOp::BindRight { singleton } => {
                container
                    .try_bind(|| Arc::new(Right::default()), "", lifetime(singleton))
                    .unwrap();
            }
            ContainerOp::BindFailing => {
                let err = container.try_bind(|| 7_u8, "", Lifetime::Singleton).unwrap_err();
                assert!(matches!(err, DiError::InvalidProviderSignature { .. }));
            }
            ContainerOp::GetLeaf { named } => {
                let name = if named { "leaf" } else { "" };
                let bound = container.contains_named::<Arc<Leaf>>(name);
                assert_eq!(container.try_named_get::<Arc<Leaf>>(name).is_ok(), bound);
            }
            ContainerOp::GetLeft => {
                // Cached singletons keep whatever edges earlier ops left them
                if let Ok(left) = container.try_get::<Arc<Left>>() {
                    release(&left);
                }
            }
            ContainerOp::ResolveRight => {
                let mut right: Option<Arc<Right>> = None;
                if container.try_resolve(&mut right).is_ok() {
                    assert!(right.is_some());
                    if let Some(left) = right.and_then(|right| right.left.take()) {
                        release(&left);
                    }
                }
            }
            ContainerOp::FillLeft => {
                let left = Left::default();
                let _ = container.try_fill(&left);
                release(&left);
            }
            ContainerOp::CallPair => {
                let _ = container.try_call(|left: Arc<Left>, right: Arc<Right>| {
                    release(&left);
                    right.left.take();
                });
            }
            ContainerOp::Reset => {
                container.reset();
                assert!(container.is_empty());
            }
        }
    }
});
