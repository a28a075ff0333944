//! Blob storage for merchandise images.
//!
//! The catalog only ever uploads; it never replaces or deletes a blob. A
//! failed merchandise insert after a successful upload leaves the blob behind.

use std::future::Future;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image upload is empty")]
    Empty,

    #[error("image is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image format '{0}'; expected one of png, jpg, jpeg, webp, gif")]
    UnsupportedFormat(String),

    #[error("failed to write image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ImageStoreError {
    /// `true` when the upload itself was rejected, as opposed to a storage fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImageStoreError::Io { .. })
    }
}

/// An image as received from the caller.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Stable identifier inside the store.
    pub key: String,
    pub url: String,
    pub content_type: Option<String>,
    pub byte_size: usize,
}

/// Append-only blob store: `upload(file) -> {key, url}`.
pub trait ImageStore: Send + Sync {
    fn upload(
        &self,
        upload: &ImageUpload,
    ) -> impl Future<Output = Result<StoredImage, ImageStoreError>> + Send;
}

/// Stores images on local disk under a content-hash key and serves them
/// from `base_url`.
///
/// Identical bytes map to the same key, so re-uploading a file reuses the
/// existing blob.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &rxmart_core::AppConfig) -> Self {
        Self::new(
            config.image_dir.clone(),
            config.image_base_url.clone(),
            config.image_max_bytes,
        )
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(&self, upload: &ImageUpload) -> Result<String, ImageStoreError> {
        if upload.bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(ImageStoreError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }
        image_extension(upload)
    }
}

impl ImageStore for LocalImageStore {
    async fn upload(&self, upload: &ImageUpload) -> Result<StoredImage, ImageStoreError> {
        let ext = self.validate(upload)?;
        let key = storage_key(&upload.bytes, &ext);
        let path = self.root.join(&key);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(key = %key, "image already stored; reusing blob");
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| io_error(parent, source))?;
            }
            tokio::fs::write(&path, &upload.bytes)
                .await
                .map_err(|source| io_error(&path, source))?;
            tracing::info!(key = %key, bytes = upload.bytes.len(), "stored image");
        }

        Ok(StoredImage {
            url: format!("{}/{key}", self.base_url),
            key,
            content_type: upload
                .content_type
                .clone()
                .or_else(|| content_type_for(&ext).map(str::to_string)),
            byte_size: upload.bytes.len(),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ImageStoreError {
    ImageStoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Lowercase extension from the file name, falling back to the content type.
fn image_extension(upload: &ImageUpload) -> Result<String, ImageStoreError> {
    let from_name = upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let from_type = || {
        upload
            .content_type
            .as_deref()
            .and_then(|ct| ct.strip_prefix("image/"))
            .map(str::to_ascii_lowercase)
    };

    let ext = from_name.or_else(from_type).unwrap_or_default();
    if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ImageStoreError::UnsupportedFormat(ext))
    }
}

/// `ab/ab12…ef.png`: the SHA-256 of the bytes, sharded by its first two hex
/// characters.
fn storage_key(bytes: &[u8], ext: &str) -> String {
    let hash = format!("{:x}", Sha256::digest(bytes));
    format!("{}/{hash}.{ext}", &hash[..2])
}

fn content_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
