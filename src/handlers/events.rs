use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use crate::access::{Caller, Command};
use crate::models::EventPayload;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};
use crate::AppState;

pub async fn list_events(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, AppError> {
    let events = state.events.list(caller.role).await?;
    let message = format!("Found {} event(s)", events.len());
    Ok(success(events, message))
}

pub async fn create_event(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

    let event = state.events.insert(caller.role, payload).await?;
    Ok(created(event, "Event created"))
}

// Mounted on both the collection and `/:id`. The target row never matters
// because no policy grants the command.
pub async fn update_event(State(state): State<AppState>, caller: Caller) -> AppError {
    state.events.reject_mutation(caller.role, Command::Update)
}

pub async fn delete_event(State(state): State<AppState>, caller: Caller) -> AppError {
    state.events.reject_mutation(caller.role, Command::Delete)
}
