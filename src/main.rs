use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use events_server::access::{Command, PolicySet};
use events_server::config::Config;
use events_server::routes::create_routes;
use events_server::store::{EventStore, MemoryEventStore, PgEventStore};
use events_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let policies = PolicySet::for_mode(config.access_policy);
    tracing::info!(access_policy = config.access_policy.as_str(), "Access policy loaded");

    let store: Arc<dyn EventStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations run successfully");

            let store = PgEventStore::new(pool);
            match store.insert_policies().await {
                Ok(installed) if policies.agrees_with_installed(Command::Insert, &installed) => {
                    tracing::info!(?installed, "Installed insert policies match ACCESS_POLICY");
                }
                Ok(installed) => tracing::warn!(
                    ?installed,
                    expected = ?policies.policy_names(Command::Insert),
                    access_policy = config.access_policy.as_str(),
                    "Installed insert policies disagree with ACCESS_POLICY"
                ),
                Err(e) => tracing::warn!(error = %e, "Could not read installed policies"),
            }
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory only");
            Arc::new(MemoryEventStore::new())
        }
    };

    let app = create_routes(AppState::new(store, policies, config.api_keys()));

    tracing::info!("Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
