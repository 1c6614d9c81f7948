use library_checkout::{
    adapters::{
        SystemClock,
        postgres::{PostgresLibraryStore, pool},
    },
    api::{handlers::AppState, router::create_router},
    application::checkout::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_checkout=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Initialize database connection pool
    let pool = pool::connect(&config.database)
        .await
        .expect("Failed to connect to database");

    if config.database.run_migrations {
        pool::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        tracing::info!("Database migrations applied");
    }

    // Initialize adapters
    let store = Arc::new(PostgresLibraryStore::new(pool));
    let clock = Arc::new(SystemClock);

    // Create service dependencies
    let service_deps = ServiceDependencies { store, clock };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
