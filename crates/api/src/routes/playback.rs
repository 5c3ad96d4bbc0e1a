//! Route definitions for the playlist and the kiosk playback controls.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::playback;
use crate::state::AppState;

/// Routes mounted at the API root: `/playlist` and `/playback/*`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/playlist", get(playback::playlist))
        .route("/playback", get(playback::snapshot))
        .route("/playback/advance", post(playback::advance))
        .route("/playback/previous", post(playback::previous))
        .route("/playback/pause", post(playback::pause))
        .route("/playback/resume", post(playback::resume))
        .route("/playback/jump", post(playback::jump))
        .route("/playback/media-ended", post(playback::media_ended))
        .route("/playback/refresh", post(playback::refresh))
}
