//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out [`PlatformEvent`]s describing changes to the media
//! library. The playback engine subscribes to refresh its eligible set as
//! soon as an operator uploads, edits, toggles, or deletes media.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signage_core::types::DbId;
use tokio::sync::broadcast;

/// Event names published by the API.
pub mod event_types {
    pub const MEDIA_UPLOADED: &str = "media.uploaded";
    pub const MEDIA_UPDATED: &str = "media.updated";
    pub const MEDIA_STATUS_TOGGLED: &str = "media.status_toggled";
    pub const MEDIA_DELETED: &str = "media.deleted";

    /// Prefix shared by every media library event.
    pub const MEDIA_PREFIX: &str = "media.";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// Something that happened to the media library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"media.deleted"`.
    pub event_type: String,

    /// The affected media asset, if any.
    pub media_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            media_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the affected media asset.
    pub fn with_media(mut self, media_id: DbId) -> Self {
        self.media_id = Some(media_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether this event changes the media library.
    pub fn is_media_change(&self) -> bool {
        self.event_type.starts_with(event_types::MEDIA_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use signage_events::bus::{event_types, EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(event_types::MEDIA_UPLOADED).with_media(1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        tracing::debug!(event_type = %event.event_type, media_id = ?event.media_id, "Publishing event");
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
