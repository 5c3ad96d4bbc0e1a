use std::sync::Arc;

use signage_events::EventBus;

use crate::config::ServerConfig;
use crate::playback::PlaybackEngine;
use crate::storage::LocalMediaStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: signage_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for media library changes.
    pub event_bus: Arc<EventBus>,
    /// Where uploaded files are written and served from.
    pub media_store: Arc<LocalMediaStore>,
    /// Server-side rotation state for the kiosk player.
    pub playback: Arc<PlaybackEngine>,
}
