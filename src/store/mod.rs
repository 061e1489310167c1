use async_trait::async_trait;

use crate::access::Role;
use crate::models::{Event, NewEvent};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Append-only persistence for event rows.
///
/// Every insert is atomic and receives an id strictly greater than any id
/// handed out before it. `list` returns all committed rows ordered by id.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, role: Role, event: NewEvent) -> Result<Event, AppError>;

    async fn list(&self, role: Role) -> Result<Vec<Event>, AppError>;

    fn backend(&self) -> &'static str;
}
