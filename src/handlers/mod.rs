use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::access::PolicyMode;
use crate::utils::response::success;
use crate::AppState;

pub mod events;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    access_policy: PolicyMode,
    store: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "events-api",
        access_policy: state.events.mode(),
        store: state.events.backend(),
    };

    success(payload, "Health check successful")
}
