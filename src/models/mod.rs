pub mod event;

pub use event::{Event, EventPayload, NewEvent};
