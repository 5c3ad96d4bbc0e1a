//! Local disk storage for uploaded media files.
//!
//! Files are written under a single upload directory and served back at
//! [`UPLOADS_ROUTE`]. The database keeps the on-disk path as the storage
//! reference and hands out the public URL to clients.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use signage_core::media::file_extension;
use uuid::Uuid;

/// Route prefix under which stored files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Prefix of generated file names (matches the multipart field name).
const FILE_NAME_PREFIX: &str = "files";

/// Where a saved upload ended up.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated file name inside the upload directory.
    pub file_name: String,
    /// Full path on disk (the storage reference).
    pub path: PathBuf,
    /// URL clients use to fetch the file.
    pub public_url: String,
}

/// File store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Public URL for a stored file name.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}{UPLOADS_ROUTE}/{file_name}", self.public_base_url)
    }

    /// Write `data` under a freshly generated, collision-resistant name that
    /// keeps the extension of `original_name`.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> std::io::Result<StoredFile> {
        self.ensure_root().await?;

        let file_name = generate_file_name(original_name);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, data).await?;

        tracing::debug!(path = %path.display(), size = data.len(), "Stored upload");
        Ok(StoredFile {
            public_url: self.public_url(&file_name),
            file_name,
            path,
        })
    }

    /// Delete a stored file. Returns `false` if it was already gone.
    pub async fn remove(&self, storage_ref: &str) -> std::io::Result<bool> {
        match tokio::fs::remove_file(storage_ref).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// `files-<unix millis>-<random>.<ext>`
fn generate_file_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().as_u128() % 1_000_000_000;
    match file_extension(original_name) {
        Some(ext) => format!("{FILE_NAME_PREFIX}-{millis}-{suffix}.{ext}"),
        None => format!("{FILE_NAME_PREFIX}-{millis}-{suffix}"),
    }
}
