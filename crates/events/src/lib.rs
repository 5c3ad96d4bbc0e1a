//! In-process event bus for media lifecycle changes.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope.
//! - [`event_types`]: the event names published by the API.

pub mod bus;

pub use bus::{event_types, EventBus, PlatformEvent};
