//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use graph_injector::{Autowire, Container, Inject};
use std::sync::Arc;

// Example services
#[allow(dead_code)]
#[derive(Autowire)]
struct Database {
    url: String,
}

#[derive(Autowire, Default)]
struct UserService {
    #[di = "type"]
    db: Inject<Database>,
}

#[derive(Autowire, Default)]
struct RequestContext {
    #[di = "type"]
    users: Inject<UserService>,
}

fn main() {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled
    graph_injector::logging::init();

    println!("=== graph-injector Logging Demo ===\n");

    let container = Container::new();
    container.set_error_handler(|err| println!("  [App] error: {err}"));

    // Events are only emitted while the debug toggle is on
    container.enable_debug_logging();

    // Register services (logs: "Registering provider")
    container
        .singleton(|| {
            Arc::new(Database {
                url: "postgres://localhost/mydb".into(),
            })
        })
        .singleton(|| Arc::new(UserService::default()))
        .instance(|| {
            println!("  [App] Request context being created...");
            Arc::new(RequestContext::default())
        });

    // Resolve (logs: "Invoking provider", "Resolving field")
    let ctx = container.get::<Arc<RequestContext>>().unwrap();
    assert!(ctx.users.get().is_some());

    // Fill a value built by hand (logs: "Filling struct")
    let users = UserService::default();
    container.fill(&users);

    // Missing binding (logs: "Resolving binding", then the error handler runs)
    let missing = container.named_get::<Arc<Database>>("replica");
    assert!(missing.is_none());

    container.disable_debug_logging();

    // Silent from here on
    let _ = container.get::<Arc<RequestContext>>();

    // Or send one container's events to its own subscriber
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    {
        let scoped = Container::new();
        scoped.set_log_dispatch(graph_injector::logging::builder().compact().di_only().dispatch());
        scoped.enable_debug_logging();
        scoped.singleton(|| {
            Arc::new(Database {
                url: "sqlite::memory:".into(),
            })
        });
        let _ = scoped.get::<Arc<Database>>();
    }

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
