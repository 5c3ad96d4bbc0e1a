//! Query and body parameter types shared by the playback handlers.
//!
//! Media listing filters live next to the model in
//! [`signage_db::models::media_asset::MediaListFilter`].

use serde::Deserialize;
use signage_core::error::CoreError;
use signage_core::scheduling::parse_instant;
use signage_core::types::{DbId, Timestamp};

/// `?at=` for previewing the playlist at another moment.
///
/// Accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date.
#[derive(Debug, Default, Deserialize)]
pub struct PlaylistParams {
    pub at: Option<String>,
}

impl PlaylistParams {
    /// The instant to evaluate at, defaulting to `now`.
    pub fn instant(&self, now: Timestamp) -> Result<Timestamp, CoreError> {
        match self.at.as_deref().map(str::trim) {
            None | Some("") => Ok(now),
            Some(raw) => parse_instant(raw),
        }
    }
}

/// Body of `POST /playback/jump`.
#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub index: usize,
}

/// Body of `POST /playback/media-ended`.
#[derive(Debug, Deserialize)]
pub struct MediaEndedRequest {
    pub asset_id: DbId,
}
