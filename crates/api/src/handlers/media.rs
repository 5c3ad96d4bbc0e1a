//! Handlers for the `/media` resource.
//!
//! Uploads, schedule edits, status toggles, and deletion of media assets.
//! Every mutation publishes a `media.*` event so the playback engine picks
//! up the change without waiting for its next periodic refresh.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use signage_core::error::CoreError;
use signage_core::media::{classify_upload, MediaKind};
use signage_core::scheduling::{
    effective_status, parse_instant, plan_toggle, validate_duration, validate_priority,
    ActiveWindow, MediaStatus,
};
use signage_core::serde_helpers::window_bound;
use signage_core::types::{DbId, Timestamp};
use signage_db::models::media_asset::{
    CreateMediaAsset, MediaAsset, MediaListFilter, UpdateMediaAsset,
};
use signage_db::repositories::MediaAssetRepo;
use signage_events::{event_types, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, StatusChange};
use crate::state::AppState;

/// Multipart field carrying file parts.
const FILES_FIELD: &str = "files";

/// A media asset together with its status resolved at response time.
#[derive(Debug, Serialize)]
pub struct MediaAssetView {
    #[serde(flatten)]
    pub asset: MediaAsset,
    pub effective_status: MediaStatus,
}

impl MediaAssetView {
    fn at(asset: MediaAsset, now: Timestamp) -> Self {
        let effective_status = effective_status(&asset, now);
        Self {
            asset,
            effective_status,
        }
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "MediaAsset",
        id,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/media?kind=&status=&search=
///
/// List media, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<MediaListFilter>,
) -> AppResult<impl IntoResponse> {
    let assets = MediaAssetRepo::list(&state.pool, &filter).await?;
    let now = Utc::now();
    let views: Vec<_> = assets
        .into_iter()
        .map(|asset| MediaAssetView::at(asset, now))
        .collect();
    Ok(Json(DataResponse { data: views }))
}

/// GET /api/v1/media/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let asset = MediaAssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: MediaAssetView::at(asset, Utc::now()),
    }))
}

/// POST /api/v1/media/upload
///
/// Accepts one or more `files` parts. Scheduling settings for the whole
/// batch come either from a JSON `settings` part or from individual
/// `duration`, `priority`, `start_date`, and `end_date` fields.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut files: Vec<IncomingFile> = Vec::new();
    let mut settings = UploadSettings::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            FILES_FIELD => {
                let original_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| AppError::BadRequest("File part is missing a file name".into()))?
                    .to_string();
                let mime = field.content_type().unwrap_or("").to_string();
                let kind = classify_upload(&mime, &original_name)?;
                let data = read_file_part(field, state.config.max_upload_bytes).await?;
                files.push(IncomingFile {
                    original_name,
                    kind,
                    data,
                });
            }
            "settings" => {
                let text = field.text().await?;
                settings = serde_json::from_str(&text).map_err(|e| {
                    CoreError::Validation(format!("Invalid settings: {e}"))
                })?;
            }
            other => {
                let text = field.text().await?;
                settings.set_field(other, &text)?;
            }
        }
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    let window = settings.window()?;
    if let Some(duration) = settings.duration {
        validate_duration(duration)?;
    }
    if let Some(priority) = settings.priority {
        validate_priority(priority)?;
    }

    let assets = store_batch(&state, files, &settings, window).await?;

    let now = Utc::now();
    let mut created = Vec::with_capacity(assets.len());
    for asset in assets {
        tracing::info!(
            media_id = asset.id,
            kind = %asset.kind,
            size = asset.size_bytes,
            "Media uploaded"
        );
        state.event_bus.publish(
            PlatformEvent::new(event_types::MEDIA_UPLOADED)
                .with_media(asset.id)
                .with_payload(json!({ "kind": asset.kind })),
        );
        created.push(MediaAssetView::at(asset, now));
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/media/{id}
///
/// Partial update of duration, priority, status, and window bounds.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let input: UpdateMediaAsset = serde_json::from_value(body)
        .map_err(|e| CoreError::Validation(format!("Invalid update: {e}")))?;
    let patch = input.to_patch()?;

    let asset = MediaAssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if patch.is_empty() {
        return Ok(Json(DataResponse {
            data: MediaAssetView::at(asset, Utc::now()),
        }));
    }

    let fields = asset.schedule().apply(&patch)?;
    let updated = MediaAssetRepo::update_schedule(&state.pool, id, &fields)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(media_id = id, "Media schedule updated");
    state
        .event_bus
        .publish(PlatformEvent::new(event_types::MEDIA_UPDATED).with_media(id));

    Ok(Json(DataResponse {
        data: MediaAssetView::at(updated, Utc::now()),
    }))
}

/// DELETE /api/v1/media/{id}
///
/// Removes the record, then the stored file. A file that is already gone
/// or cannot be removed is logged and does not fail the request.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let storage_ref = MediaAssetRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    match state.media_store.remove(&storage_ref).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(media_id = id, path = %storage_ref, "Stored file already missing"),
        Err(e) => tracing::error!(media_id = id, path = %storage_ref, error = %e, "Failed to remove stored file"),
    }

    tracing::info!(media_id = id, "Media deleted");
    state
        .event_bus
        .publish(PlatformEvent::new(event_types::MEDIA_DELETED).with_media(id));

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/media/{id}/toggle-status
///
/// Flip the manual status. Activating outside the active window is
/// rejected with `409 OUT_OF_WINDOW`.
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let asset = MediaAssetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let status = plan_toggle(&asset, Utc::now())?;
    let updated = MediaAssetRepo::set_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(media_id = id, status = %updated.status, "Media status toggled");
    state.event_bus.publish(
        PlatformEvent::new(event_types::MEDIA_STATUS_TOGGLED)
            .with_media(id)
            .with_payload(json!({ "status": updated.status })),
    );

    Ok(Json(DataResponse {
        data: StatusChange {
            id,
            status: updated.status,
        },
    }))
}

// ---------------------------------------------------------------------------
// Upload helpers
// ---------------------------------------------------------------------------

struct IncomingFile {
    original_name: String,
    kind: MediaKind,
    data: Vec<u8>,
}

/// Scheduling settings applied to every file of an upload batch.
#[derive(Debug, Default, Deserialize)]
struct UploadSettings {
    #[serde(default, alias = "duration_secs")]
    duration: Option<i32>,
    #[serde(default)]
    priority: Option<i32>,
    #[serde(
        default,
        alias = "startDate",
        alias = "active_from",
        deserialize_with = "window_bound"
    )]
    start_date: Option<Option<Timestamp>>,
    #[serde(
        default,
        alias = "endDate",
        alias = "active_until",
        deserialize_with = "window_bound"
    )]
    end_date: Option<Option<Timestamp>>,
}

impl UploadSettings {
    /// Apply a plain form field. Unknown fields are ignored.
    fn set_field(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        let value = value.trim();
        match name {
            "duration" | "duration_secs" => self.duration = parse_number(name, value)?,
            "priority" => self.priority = parse_number(name, value)?,
            "start_date" | "startDate" => self.start_date = Some(parse_bound(value)?),
            "end_date" | "endDate" => self.end_date = Some(parse_bound(value)?),
            _ => {}
        }
        Ok(())
    }

    fn window(&self) -> Result<ActiveWindow, CoreError> {
        ActiveWindow::new(self.start_date.flatten(), self.end_date.flatten())
    }
}

fn parse_number(name: &str, value: &str) -> Result<Option<i32>, CoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("'{name}' must be an integer, got '{value}'")))
}

fn parse_bound(value: &str) -> Result<Option<Timestamp>, CoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_instant(value).map(Some)
}

/// Read one file part, rejecting it once it grows past `limit` bytes.
async fn read_file_part(mut field: Field<'_>, limit: usize) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > limit {
            return Err(AppError::BadRequest("File too large".into()));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Write every file, then insert all records in one transaction.
///
/// If any step fails, the files written so far are removed and no record
/// is left behind.
async fn store_batch(
    state: &AppState,
    files: Vec<IncomingFile>,
    settings: &UploadSettings,
    window: ActiveWindow,
) -> AppResult<Vec<MediaAsset>> {
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        let stored = match state.media_store.save(&file.original_name, &file.data).await {
            Ok(stored) => stored,
            Err(e) => {
                discard_stored(state, &inputs).await;
                return Err(AppError::InternalError(format!("Failed to store upload: {e}")));
            }
        };
        inputs.push(CreateMediaAsset {
            display_name: stored.file_name,
            original_name: file.original_name,
            kind: file.kind,
            storage_ref: stored.path.to_string_lossy().to_string(),
            public_url: stored.public_url,
            size_bytes: file.data.len() as i64,
            duration_secs: settings.duration,
            priority: settings.priority,
            window,
        });
    }

    match MediaAssetRepo::create_many(&state.pool, &inputs).await {
        Ok(assets) => Ok(assets),
        Err(e) => {
            discard_stored(state, &inputs).await;
            Err(e.into())
        }
    }
}

async fn discard_stored(state: &AppState, inputs: &[CreateMediaAsset]) {
    for input in inputs {
        if let Err(e) = state.media_store.remove(&input.storage_ref).await {
            tracing::error!(path = %input.storage_ref, error = %e, "Failed to remove orphaned upload");
        }
    }
}
