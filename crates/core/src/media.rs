//! Media kind classification and upload constraints.
//!
//! The media kind is decided once at ingestion and carried on the record.
//! Rendering and timing code switch on [`MediaKind`] instead of
//! re-deriving the type from MIME strings or file extensions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum accepted upload size (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// How many maximum-size files fit in one upload request body.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// Accepted image file extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// Accepted video file extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "webm"];

/// Accepted document file extensions.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// MIME type of PDF documents.
const PDF_MIME: &str = "application/pdf";

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Closed set of media kinds the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Pdf,
}

/// What moves playback past an item of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// Advance after the item's configured duration elapses.
    Elapsed,
    /// Advance when the player reports the end of the media.
    MediaEnd,
}

impl MediaKind {
    /// Parse from the database `kind` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "pdf" => Ok(Self::Pdf),
            other => Err(CoreError::Validation(format!(
                "Unknown media kind '{other}'. Must be one of: image, video, pdf"
            ))),
        }
    }

    /// Database name value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Pdf => "pdf",
        }
    }

    /// File extensions accepted for this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
            Self::Pdf => PDF_EXTENSIONS,
        }
    }

    /// Videos run until the player reports the end; everything else is timed.
    pub fn advance_trigger(self) -> AdvanceTrigger {
        match self {
            Self::Video => AdvanceTrigger::MediaEnd,
            Self::Image | Self::Pdf => AdvanceTrigger::Elapsed,
        }
    }

    /// Map a MIME type to a kind, if it belongs to one.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else if mime == PDF_MIME {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MediaKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value)
    }
}

// ---------------------------------------------------------------------------
// Upload classification
// ---------------------------------------------------------------------------

/// Lowercased extension of `file_name`, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Decide the kind of an uploaded file.
///
/// The MIME type selects the kind and the file extension must be one of the
/// extensions accepted for that kind. Anything else is rejected.
pub fn classify_upload(mime: &str, file_name: &str) -> Result<MediaKind, CoreError> {
    let kind = MediaKind::from_mime(mime).ok_or_else(|| {
        CoreError::Validation(format!(
            "Unsupported content type '{mime}'. Only image, video, and PDF files are allowed"
        ))
    })?;

    let ext = file_extension(file_name).ok_or_else(|| {
        CoreError::Validation(format!("File '{file_name}' has no extension"))
    })?;

    if !kind.extensions().contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Extension '.{ext}' does not match {kind} content. Allowed: {:?}",
            kind.extensions()
        )));
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn classifies_by_mime_and_extension() {
        assert_eq!(classify_upload("image/png", "menu.PNG").unwrap(), MediaKind::Image);
        assert_eq!(classify_upload("video/mp4", "promo.mp4").unwrap(), MediaKind::Video);
        assert_eq!(
            classify_upload("application/pdf", "wine-list.pdf").unwrap(),
            MediaKind::Pdf
        );
    }

    #[test]
    fn rejects_unknown_mime() {
        assert_matches!(
            classify_upload("text/plain", "notes.txt"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_extension_of_another_kind() {
        assert_matches!(
            classify_upload("image/jpeg", "sneaky.mp4"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_missing_extension() {
        assert_matches!(
            classify_upload("image/jpeg", "photo"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn video_waits_for_media_end() {
        assert_eq!(MediaKind::Video.advance_trigger(), AdvanceTrigger::MediaEnd);
        assert_eq!(MediaKind::Image.advance_trigger(), AdvanceTrigger::Elapsed);
        assert_eq!(MediaKind::Pdf.advance_trigger(), AdvanceTrigger::Elapsed);
    }

    #[test]
    fn name_round_trip_and_unknown() {
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Pdf] {
            assert_eq!(MediaKind::from_name(kind.as_str()).unwrap(), kind);
        }
        assert_matches!(MediaKind::from_name("gif"), Err(CoreError::Validation(_)));
    }
}
