use std::sync::Arc;

use crate::access::{Command, PolicyMode, PolicySet, Role};
use crate::models::{Event, EventPayload};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// Mediates every access to the event table through the active policy set.
pub struct EventService {
    store: Arc<dyn EventStore>,
    policies: PolicySet,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, policies: PolicySet) -> Self {
        Self { store, policies }
    }

    pub fn mode(&self) -> PolicyMode {
        self.policies.mode()
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn insert(&self, role: Role, payload: EventPayload) -> Result<Event, AppError> {
        self.policies.authorize(Command::Insert, role)?;
        let candidate = payload.validate()?;

        let event = self.store.insert(role, candidate).await?;
        tracing::info!(event_id = event.id, %role, city = %event.city, "Event inserted");
        Ok(event)
    }

    pub async fn list(&self, role: Role) -> Result<Vec<Event>, AppError> {
        self.policies.authorize(Command::Select, role)?;
        self.store.list(role).await
    }

    /// Rows are append-only: UPDATE and DELETE have no granting policy and
    /// the stores expose no way to perform them.
    pub fn reject_mutation(&self, role: Role, command: Command) -> AppError {
        match self.policies.authorize(command, role) {
            Err(denied) => denied,
            Ok(()) => AppError::Forbidden(format!("{} is not supported on events", command)),
        }
    }
}
