use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::events::{create_event, delete_event, list_events, update_event};
use crate::handlers::health_check;
use crate::AppState;

pub const EVENTS_PATH: &str = "/rest/v1/events";

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            EVENTS_PATH,
            get(list_events)
                .post(create_event)
                .patch(update_event)
                .delete(delete_event),
        )
        .route(
            &format!("{}/:id", EVENTS_PATH),
            patch(update_event).delete(delete_event),
        )
        .with_state(state)
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
}
