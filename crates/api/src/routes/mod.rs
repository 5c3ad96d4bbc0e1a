pub mod health;
pub mod media;
pub mod playback;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /media                                list (GET)
/// /media/upload                         multipart upload (POST)
/// /media/{id}                           get, update, delete
/// /media/{id}/toggle-status             flip manual status (PATCH)
///
/// /playlist                             eligible set, optional ?at= (GET)
///
/// /playback                             current snapshot (GET)
/// /playback/advance                     next item (POST)
/// /playback/previous                    previous item (POST)
/// /playback/pause                       pause (POST)
/// /playback/resume                      resume (POST)
/// /playback/jump                        jump to index (POST)
/// /playback/media-ended                 video finished (POST)
/// /playback/refresh                     reload from the store (POST)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/media", media::router(config.max_upload_bytes))
        .merge(playback::router())
}
