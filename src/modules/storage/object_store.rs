use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};

/// Allowed MIME types for catalogue images (jpg, jpeg, png)
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Maximum image size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Get file extension from content type
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// An image received from a client, validated but not yet stored
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl UploadedImage {
    pub fn new(data: Vec<u8>, file_name: String, content_type: String) -> Result<Self> {
        if data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "Image too large. Maximum size is {} bytes ({} MB)",
                MAX_IMAGE_SIZE,
                MAX_IMAGE_SIZE / 1024 / 1024
            )));
        }

        // Some clients send a generic content type; fall back to the file extension
        let content_type = if ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            content_type
        } else {
            match file_name.rsplit('.').next().map(str::to_ascii_lowercase) {
                Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg".to_string(),
                Some(ext) if ext == "png" => "image/png".to_string(),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "Image type '{}' is not allowed. Allowed types: {}",
                        content_type,
                        ALLOWED_IMAGE_TYPES.join(", ")
                    )))
                }
            }
        };

        Ok(Self {
            data,
            file_name,
            content_type,
        })
    }

    pub fn extension(&self) -> &'static str {
        extension_for_content_type(&self.content_type).unwrap_or("jpg")
    }
}

/// Where a stored image lives: the public URL clients load, and the key the
/// store needs to delete it again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub key: String,
}

/// Object storage for catalogue images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an image under `folder` and return its URL and key
    async fn upload(&self, folder: &str, image: UploadedImage) -> Result<StoredImage>;

    /// Delete the blob stored under `key`
    async fn destroy(&self, key: &str) -> Result<()>;
}
