//! Media scheduling rules: manual status, active windows, and the
//! effective-status resolver.
//!
//! An operator's intent (the manual status flag) is kept separate from
//! time-based eligibility (the active window) so an asset can be scheduled
//! ahead of time without someone flipping it live by hand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media::MediaKind;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest accepted playback duration in seconds.
pub const MIN_DURATION_SECS: i32 = 1;

/// Duration applied to uploads that do not specify one.
pub const DEFAULT_DURATION_SECS: i32 = 30;

/// Priority applied to uploads that do not specify one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Lowest accepted priority value.
pub const MIN_PRIORITY: i32 = -10_000;

/// Highest accepted priority value.
pub const MAX_PRIORITY: i32 = 10_000;

// ---------------------------------------------------------------------------
// MediaStatus
// ---------------------------------------------------------------------------

/// Display status. Used both for the operator's manual flag and for the
/// resolved effective status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Active,
    Inactive,
}

impl MediaStatus {
    /// Parse from the database `status` column or an operator request.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(
                "Status must be either \"active\" or \"inactive\"".into(),
            )),
        }
    }

    /// Database name value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// The opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MediaStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value)
    }
}

// ---------------------------------------------------------------------------
// ActiveWindow
// ---------------------------------------------------------------------------

/// Where an instant falls relative to an [`ActiveWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Before the start bound.
    NotStarted,
    /// Inside the window (bounds inclusive).
    Within,
    /// After the end bound.
    Expired,
}

/// Optional start/end instants bounding automatic eligibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActiveWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl ActiveWindow {
    /// A window with neither bound set.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a window, rejecting a start that falls after the end.
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Result<Self, CoreError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    /// Check that `start <= end` when both bounds are present.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(CoreError::Validation(format!(
                "Active window start ({}) must not be after its end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            ))),
            _ => Ok(()),
        }
    }

    /// Locate `now` relative to the window.
    pub fn position(&self, now: Timestamp) -> WindowPosition {
        if self.start.is_some_and(|start| now < start) {
            WindowPosition::NotStarted
        } else if self.end.is_some_and(|end| now > end) {
            WindowPosition::Expired
        } else {
            WindowPosition::Within
        }
    }

    /// Whether `now` lies inside the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        self.position(now) == WindowPosition::Within
    }
}

/// Parse a window bound from an RFC 3339 timestamp or a plain
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(value: &str) -> Result<Timestamp, CoreError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid date '{value}'. Expected RFC 3339 or YYYY-MM-DD"
            ))
        })
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Read-only view of a media record's scheduling attributes.
///
/// Implemented by the database model; the resolver and the sequencer only
/// ever see snapshots through this trait.
pub trait ScheduledMedia {
    fn media_id(&self) -> DbId;
    fn kind(&self) -> MediaKind;
    fn priority(&self) -> i32;
    fn duration_secs(&self) -> i32;
    fn manual_status(&self) -> MediaStatus;
    fn active_window(&self) -> ActiveWindow;
}

/// Resolve the status from a manual flag and a window.
///
/// A manual `Inactive` always wins. Otherwise the asset is active exactly
/// when `now` lies inside the window (an unbounded window always matches).
pub fn resolve_status(manual: MediaStatus, window: &ActiveWindow, now: Timestamp) -> MediaStatus {
    match manual {
        MediaStatus::Inactive => MediaStatus::Inactive,
        MediaStatus::Active if window.contains(now) => MediaStatus::Active,
        MediaStatus::Active => MediaStatus::Inactive,
    }
}

/// Whether `media` is eligible for display at `now`.
pub fn effective_status<M: ScheduledMedia + ?Sized>(media: &M, now: Timestamp) -> MediaStatus {
    resolve_status(media.manual_status(), &media.active_window(), now)
}

/// Decide the new manual status for an operator toggle.
///
/// Turning an asset off is always allowed. Turning it on is rejected with
/// [`CoreError::OutOfWindow`] when the window excludes `now`, since the
/// operator would see no effect.
pub fn plan_toggle<M: ScheduledMedia + ?Sized>(
    media: &M,
    now: Timestamp,
) -> Result<MediaStatus, CoreError> {
    let next = media.manual_status().toggled();
    if next == MediaStatus::Inactive {
        return Ok(next);
    }

    let window = media.active_window();
    match window.position(now) {
        WindowPosition::Within => Ok(next),
        WindowPosition::NotStarted => Err(CoreError::OutOfWindow(format!(
            "Media {} is scheduled to start at {}",
            media.media_id(),
            window.start.map(|s| s.to_rfc3339()).unwrap_or_default()
        ))),
        WindowPosition::Expired => Err(CoreError::OutOfWindow(format!(
            "Media {} expired at {}",
            media.media_id(),
            window.end.map(|e| e.to_rfc3339()).unwrap_or_default()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// The mutable scheduling fields of a media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFields {
    pub duration_secs: i32,
    pub priority: i32,
    pub status: MediaStatus,
    pub window: ActiveWindow,
}

/// A partial update. `None` keeps the current value; for window bounds
/// `Some(None)` clears the bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulePatch {
    pub duration_secs: Option<i32>,
    pub priority: Option<i32>,
    pub status: Option<MediaStatus>,
    pub active_from: Option<Option<Timestamp>>,
    pub active_until: Option<Option<Timestamp>>,
}

impl SchedulePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ScheduleFields {
    /// Merge `patch` over the current fields and validate the result.
    pub fn apply(self, patch: &SchedulePatch) -> Result<Self, CoreError> {
        let merged = Self {
            duration_secs: patch.duration_secs.unwrap_or(self.duration_secs),
            priority: patch.priority.unwrap_or(self.priority),
            status: patch.status.unwrap_or(self.status),
            window: ActiveWindow {
                start: patch.active_from.unwrap_or(self.window.start),
                end: patch.active_until.unwrap_or(self.window.end),
            },
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Validate duration, priority bounds, and window ordering.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_duration(self.duration_secs)?;
        validate_priority(self.priority)?;
        self.window.validate()
    }
}

/// Duration must be at least [`MIN_DURATION_SECS`].
pub fn validate_duration(duration_secs: i32) -> Result<(), CoreError> {
    if duration_secs < MIN_DURATION_SECS {
        return Err(CoreError::Validation(
            "Duration must be a positive number".into(),
        ));
    }
    Ok(())
}

/// Priority must lie within [`MIN_PRIORITY`]..=[`MAX_PRIORITY`].
pub fn validate_priority(priority: i32) -> Result<(), CoreError> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(CoreError::Validation(format!(
            "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        )));
    }
    Ok(())
}
