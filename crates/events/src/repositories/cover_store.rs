//! Storage for uploaded cover images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use crate::types::{EventError, EventResult};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A cover image received from a host.
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl CoverUpload {
    /// Lower-cased image extension, or a validation error for anything
    /// that is not a supported image.
    pub fn extension(&self) -> EventResult<String> {
        if let Some(content_type) = &self.content_type {
            if !content_type.starts_with("image/") {
                return Err(EventError::validation("Cover must be an image"));
            }
        }
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                EventError::validation("Cover must be a jpg, png, gif or webp image")
            })?;
        Ok(extension)
    }
}

#[async_trait]
pub trait CoverStore: Send + Sync {
    /// Store `bytes` under the relative `key` and return the public URL.
    async fn put_cover(&self, key: &str, bytes: Bytes) -> EventResult<String>;
}

/// Writes covers below a directory that is served as static files.
#[derive(Debug, Clone)]
pub struct LocalCoverStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalCoverStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> EventResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(EventError::storage(format!("invalid cover key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl CoverStore for LocalCoverStore {
    async fn put_cover(&self, key: &str, bytes: Bytes) -> EventResult<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "stored cover image");

        Ok(format!("{}/{}", self.url_prefix.trim_end_matches('/'), key))
    }
}
