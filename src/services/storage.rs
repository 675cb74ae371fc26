//! Uploaded image storage on the local filesystem.
//!
//! Stored paths are relative to the upload root (`tools/<uuid>.png`), which is
//! what the database keeps and what `/uploads/{path}` resolves.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Image category, one subdirectory each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Tools,
    Users,
}

impl ImageCategory {
    fn dir(&self) -> &'static str {
        match self {
            ImageCategory::Tools => "tools",
            ImageCategory::Users => "users",
        }
    }
}

/// Image file taken from a multipart request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ImageStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
            max_bytes: config.max_upload_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store an uploaded image under a fresh name and return its relative path
    pub async fn save(&self, category: ImageCategory, filename: &str, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded image is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "Image exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let extension = image_extension(filename)?;
        let relative = format!("{}/{}.{}", category.dir(), Uuid::new_v4(), extension);
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::info!(path = %relative, size = bytes.len(), "image stored");
        Ok(relative)
    }

    /// Remove a stored image; a file that is already gone is not an error
    pub async fn delete(&self, relative: &str) -> AppResult<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %relative, "image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %relative, "image already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal used after the owning row is gone
    pub async fn discard(&self, relative: Option<&str>) {
        if let Some(relative) = relative {
            if let Err(e) = self.delete(relative).await {
                tracing::warn!(path = %relative, error = %e, "failed to remove image");
            }
        }
    }

    /// Read a stored file with its guessed content type
    pub async fn read(&self, relative: &str) -> AppResult<(Vec<u8>, String)> {
        let path = self.resolve(relative)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(format!("File {} not found", relative)),
            _ => AppError::Storage(e),
        })?;
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        Ok((bytes, mime.essence_str().to_string()))
    }

    /// Join a relative path onto the root, refusing anything that escapes it
    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let path = Path::new(relative);
        let safe = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::NotFound(format!("File {} not found", relative)));
        }
        Ok(self.root.join(path))
    }
}

fn image_extension(filename: &str) -> AppResult<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported image type; expected one of: {}",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(name: &str) -> ImageStorage {
        let root = std::env::temp_dir().join(format!("siyanmat-storage-{}-{}", name, Uuid::new_v4()));
        ImageStorage::new(&StorageConfig {
            upload_dir: root,
            max_upload_bytes: 16,
        })
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let storage = storage("cycle");
        let path = storage.save(ImageCategory::Tools, "Excavator.PNG", b"png-bytes").await.unwrap();
        assert!(path.starts_with("tools/"));
        assert!(path.ends_with(".png"));

        let (bytes, mime) = storage.read(&path).await.unwrap();
        assert_eq!(bytes, b"png-bytes");
        assert_eq!(mime, "image/png");

        storage.delete(&path).await.unwrap();
        assert!(matches!(storage.read(&path).await, Err(AppError::NotFound(_))));
        // Deleting twice is fine
        storage.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let storage = storage("reject");
        assert!(matches!(
            storage.save(ImageCategory::Users, "notes.txt", b"x").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.save(ImageCategory::Users, "big.jpg", &[0u8; 17]).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.save(ImageCategory::Users, "empty.jpg", b"").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let storage = storage("traversal");
        assert!(matches!(storage.read("../etc/passwd").await, Err(AppError::NotFound(_))));
        assert!(matches!(storage.read("/etc/passwd").await, Err(AppError::NotFound(_))));
        assert!(matches!(storage.read("").await, Err(AppError::NotFound(_))));
    }
}
