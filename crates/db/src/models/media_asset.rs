//! Media asset entity model and DTOs.

use serde::{Deserialize, Serialize};
use signage_core::error::CoreError;
use signage_core::media::MediaKind;
use signage_core::scheduling::{
    ActiveWindow, MediaStatus, ScheduleFields, SchedulePatch, ScheduledMedia,
};
use signage_core::serde_helpers::window_bound;
use signage_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `media_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaAsset {
    pub id: DbId,
    pub display_name: String,
    pub original_name: String,
    #[sqlx(try_from = "String")]
    pub kind: MediaKind,
    /// Location on disk. Internal; clients use `public_url`.
    #[serde(skip_serializing)]
    pub storage_ref: String,
    pub public_url: String,
    pub size_bytes: i64,
    pub duration_secs: i32,
    pub priority: i32,
    #[sqlx(try_from = "String")]
    pub status: MediaStatus,
    pub active_from: Option<Timestamp>,
    pub active_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MediaAsset {
    /// The mutable scheduling fields as they are stored now.
    pub fn schedule(&self) -> ScheduleFields {
        ScheduleFields {
            duration_secs: self.duration_secs,
            priority: self.priority,
            status: self.status,
            window: self.active_window(),
        }
    }
}

impl ScheduledMedia for MediaAsset {
    fn media_id(&self) -> DbId {
        self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn duration_secs(&self) -> i32 {
        self.duration_secs
    }

    fn manual_status(&self) -> MediaStatus {
        self.status
    }

    fn active_window(&self) -> ActiveWindow {
        ActiveWindow {
            start: self.active_from,
            end: self.active_until,
        }
    }
}

/// DTO for inserting a freshly stored upload.
///
/// Status always starts as `active`. `None` duration/priority fall back to
/// the scheduling defaults.
#[derive(Debug, Clone)]
pub struct CreateMediaAsset {
    pub display_name: String,
    pub original_name: String,
    pub kind: MediaKind,
    pub storage_ref: String,
    pub public_url: String,
    pub size_bytes: i64,
    pub duration_secs: Option<i32>,
    pub priority: Option<i32>,
    pub window: ActiveWindow,
}

/// DTO for a partial update of the scheduling fields.
///
/// Absent fields keep their value. For the window bounds, `null` or an
/// empty string clears the bound. The legacy field names `duration`,
/// `start_date`, and `end_date` are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMediaAsset {
    #[serde(alias = "duration")]
    pub duration_secs: Option<i32>,
    pub priority: Option<i32>,
    pub status: Option<String>,
    #[serde(default, alias = "start_date", deserialize_with = "window_bound")]
    pub active_from: Option<Option<Timestamp>>,
    #[serde(default, alias = "end_date", deserialize_with = "window_bound")]
    pub active_until: Option<Option<Timestamp>>,
}

impl UpdateMediaAsset {
    /// Convert to a core patch, validating the status name.
    pub fn to_patch(&self) -> Result<SchedulePatch, CoreError> {
        let status = self
            .status
            .as_deref()
            .map(MediaStatus::from_name)
            .transpose()?;
        Ok(SchedulePatch {
            duration_secs: self.duration_secs,
            priority: self.priority,
            status,
            active_from: self.active_from,
            active_until: self.active_until,
        })
    }
}

/// Filters for the admin media listing (`?kind=&status=&search=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaListFilter {
    pub kind: Option<MediaKind>,
    pub status: Option<MediaStatus>,
    /// Case-insensitive substring of the original or stored file name.
    pub search: Option<String>,
}
