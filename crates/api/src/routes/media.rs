//! Route definitions for the media library.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use signage_core::media::MAX_FILES_PER_UPLOAD;

use crate::handlers::media;
use crate::state::AppState;

/// Routes mounted at `/media`.
///
/// `max_upload_bytes` caps each file; the upload request as a whole may
/// carry up to [`MAX_FILES_PER_UPLOAD`] files of that size.
///
/// ```text
/// GET    /                     -> list
/// POST   /upload               -> upload
/// GET    /{id}                 -> get
/// PUT    /{id}                 -> update
/// DELETE /{id}                 -> delete
/// PATCH  /{id}/toggle-status   -> toggle_status
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(media::list))
        .route(
            "/upload",
            post(media::upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_mul(MAX_FILES_PER_UPLOAD),
            )),
        )
        .route(
            "/{id}",
            get(media::get).put(media::update).delete(media::delete),
        )
        .route("/{id}/toggle-status", patch(media::toggle_status))
}
