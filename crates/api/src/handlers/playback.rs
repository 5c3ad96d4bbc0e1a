//! Handlers for the playlist preview and the kiosk playback controls.
//!
//! Every control returns the resulting [`PlaybackSnapshot`] so the player
//! can render without a second round trip.
//!
//! [`PlaybackSnapshot`]: signage_core::sequencer::PlaybackSnapshot

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use signage_core::sequencer::eligible_ordered;
use signage_db::repositories::MediaAssetRepo;

use crate::error::AppResult;
use crate::query::{JumpRequest, MediaEndedRequest, PlaylistParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/playlist?at=
///
/// Media eligible at `at` (default: now), in playback order.
pub async fn playlist(
    State(state): State<AppState>,
    Query(params): Query<PlaylistParams>,
) -> AppResult<impl IntoResponse> {
    let at = params.instant(Utc::now())?;
    let media = MediaAssetRepo::list_in_insertion_order(&state.pool).await?;
    let eligible: Vec<_> = eligible_ordered(&media, at).into_iter().cloned().collect();
    Ok(Json(DataResponse { data: eligible }))
}

/// GET /api/v1/playback
pub async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.snapshot().await,
    })
}

/// POST /api/v1/playback/advance
pub async fn advance(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.advance().await,
    })
}

/// POST /api/v1/playback/previous
pub async fn previous(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.previous().await,
    })
}

/// POST /api/v1/playback/pause
pub async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.pause().await,
    })
}

/// POST /api/v1/playback/resume
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.resume().await,
    })
}

/// POST /api/v1/playback/jump
///
/// Body: `{ "index": 2 }`. Out-of-range indexes are a validation error.
pub async fn jump(
    State(state): State<AppState>,
    Json(input): Json<JumpRequest>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.playback.jump_to(input.index).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/playback/media-ended
///
/// The player finished a video. Reports for anything but the current
/// video are ignored.
pub async fn media_ended(
    State(state): State<AppState>,
    Json(input): Json<MediaEndedRequest>,
) -> impl IntoResponse {
    Json(DataResponse {
        data: state.playback.media_ended(input.asset_id).await,
    })
}

/// POST /api/v1/playback/refresh
///
/// Reload the eligible set from the store now.
pub async fn refresh(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.playback.reload(&state.pool).await?;
    Ok(Json(DataResponse { data: snapshot }))
}
