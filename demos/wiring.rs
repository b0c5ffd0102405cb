//! Example wiring a small application graph
//!
//! ```bash
//! cargo run --example wiring
//! ```

use graph_injector::{Autowire, Container, DiError, Inject, Lifetime};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

trait Store: Autowire {
    fn load(&self, key: &str) -> Option<String>;
}

#[derive(Autowire)]
struct MemoryStore {
    prefix: String,
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        Some(format!("{}{}", self.prefix, key))
    }
}

#[derive(Autowire)]
struct Metrics {
    requests: AtomicU64,
}

#[derive(Autowire, Default)]
struct Handler {
    #[di = "type"]
    store: Inject<dyn Store>,
    #[di = "type"]
    metrics: Inject<Metrics>,
    #[di = "name"]
    replica: Inject<dyn Store>,
    // Back-reference closing a cycle through the router
    #[di = "type"]
    router: Inject<Router>,
}

impl Handler {
    fn handle(&self, key: &str) -> String {
        if let Some(metrics) = self.metrics.get() {
            metrics.requests.fetch_add(1, Ordering::Relaxed);
        }
        let primary = self.store.get().and_then(|store| store.load(key));
        let replica = self.replica.get().and_then(|store| store.load(key));
        format!("{primary:?} / {replica:?}")
    }
}

#[derive(Autowire, Default)]
struct Router {
    #[di = "type"]
    handler: Inject<Handler>,
}

#[derive(Debug)]
struct Unreachable;

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("upstream unreachable")
    }
}

impl std::error::Error for Unreachable {}

#[derive(Autowire)]
struct Upstream;

fn main() {
    println!("=== graph-injector Wiring Demo ===\n");

    let container = Container::new();
    container.set_error_handler(|err: DiError| println!("  [error] {err}"));

    container
        .singleton(|| -> Arc<dyn Store> {
            Arc::new(MemoryStore {
                prefix: "primary:".into(),
            })
        })
        .named_singleton("replica", || -> Arc<dyn Store> {
            Arc::new(MemoryStore {
                prefix: "replica:".into(),
            })
        })
        .singleton(|| {
            Arc::new(Metrics {
                requests: AtomicU64::new(0),
            })
        })
        .singleton(|| Arc::new(Router::default()))
        .instance(|| Arc::new(Handler::default()));

    // 1. get: the handler arrives with every tagged field wired
    println!("1. get");
    let handler = container.get::<Arc<Handler>>().unwrap();
    println!("   {}", handler.handle("user:1"));

    // 2. the cycle Router -> Handler -> Router resolves to one router
    println!("2. cycles");
    let router = handler.router.get().unwrap();
    let inner = router.handler.get().unwrap();
    println!(
        "   router sees its own handler: {}",
        Arc::ptr_eq(&inner.router.get().unwrap(), &router)
    );

    // 3. fill: wire a value built outside the container
    println!("3. fill");
    let manual = Handler::default();
    container.fill(&manual);
    println!("   {}", manual.handle("user:2"));

    // 4. call: arguments are resolved by type
    println!("4. call");
    container.call(|metrics: Arc<Metrics>, store: Arc<dyn Store>| {
        println!(
            "   {} requests so far, store says {:?}",
            metrics.requests.load(Ordering::Relaxed),
            store.load("ping")
        );
    });

    // 5. failures go to the error handler
    println!("5. errors");
    container.singleton(|| 42_u32);
    container.singleton(|| -> Result<Arc<Upstream>, Unreachable> { Err(Unreachable) });
    let _ = container.get::<Arc<Upstream>>();
    match container.try_bind(|| Upstream, "", Lifetime::Instance) {
        Ok(()) => println!("   unexpected success"),
        Err(err) => println!("   try_bind: {err}"),
    }

    // The application graph is cyclic; break it before exit
    router.handler.take();
    inner.router.take();
    handler.router.take();
    manual.router.take();

    println!("\n=== Demo Complete ===");
}
