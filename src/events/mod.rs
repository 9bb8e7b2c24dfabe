//! # Lifecycle Events
//!
//! Run and task lifecycle events broadcast to any number of observers. Event
//! names live in [`crate::constants::events`].

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
