//! Car image storage. Uploaded blobs are written under the configured
//! uploads directory with a timestamp + UUID name and served statically,
//! never executed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::config::UploadConfig;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image type '{0}'. Allowed: png, jpg, jpeg, gif, webp.")]
    UnsupportedExtension(String),

    #[error("Image file name has no extension.")]
    MissingExtension,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

#[must_use]
pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

pub struct CarImageService {
    uploads_dir: PathBuf,
}

impl CarImageService {
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            uploads_dir: PathBuf::from(&config.uploads_path),
        }
    }

    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Persist an uploaded image and return the stored file name.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, ImageError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(ImageError::MissingExtension)?
            .to_ascii_lowercase();

        if !is_allowed_extension(&ext) {
            return Err(ImageError::UnsupportedExtension(ext));
        }

        fs::create_dir_all(&self.uploads_dir).await?;

        let filename = format!("{}_{}.{ext}", Utc::now().format("%Y%m%d_%H%M%S"), Uuid::new_v4());
        let path = self.uploads_dir.join(&filename);
        fs::write(&path, bytes).await?;

        info!(path = %path.display(), size = bytes.len(), "Stored car image");
        Ok(filename)
    }
}
