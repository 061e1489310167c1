//! Replaces the public insert policy on `events` with one that only admits
//! authenticated callers. Run once against a deployed database, then start
//! the server with `ACCESS_POLICY=production`.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

use events_server::store::PgEventStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    PgEventStore::harden_insert_policy(&pool)
        .await
        .expect("Failed to replace insert policy");

    tracing::info!("Done. Restart the server with ACCESS_POLICY=production");
}
