use std::sync::Arc;

pub mod access;
pub mod client;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use access::{ApiKeys, PolicySet};
use services::EventService;
use store::EventStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventService>,
    pub keys: Arc<ApiKeys>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, policies: PolicySet, keys: ApiKeys) -> Self {
        Self {
            events: Arc::new(EventService::new(store, policies)),
            keys: Arc::new(keys),
        }
    }
}
