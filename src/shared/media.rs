//! Keeps stored images in step with the records that reference them.
//!
//! Object storage and the database are not transactional together, so every
//! write that touches an image decides up front which blob is released on
//! commit and which on rollback.

use crate::core::error::{AppError, Result};
use crate::modules::storage::{ObjectStore, StoredImage};

/// The image side of a single record write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaChange {
    /// Image the record referenced before this write
    pub previous: Option<StoredImage>,
    /// Image uploaded as part of this write
    pub uploaded: Option<StoredImage>,
}

impl MediaChange {
    pub fn for_create(uploaded: StoredImage) -> Self {
        Self {
            previous: None,
            uploaded: Some(uploaded),
        }
    }

    pub fn for_update(previous: StoredImage, uploaded: Option<StoredImage>) -> Self {
        Self {
            previous: Some(previous),
            uploaded,
        }
    }

    /// Blob to release once the write is committed: the replaced image
    pub fn release_on_commit(&self) -> Option<&str> {
        match (&self.previous, &self.uploaded) {
            (Some(previous), Some(uploaded)) if previous.key != uploaded.key => {
                Some(previous.key.as_str())
            }
            _ => None,
        }
    }

    /// Blob to release when the write fails: the image nobody will reference
    pub fn release_on_rollback(&self) -> Option<&str> {
        self.uploaded.as_ref().map(|image| image.key.as_str())
    }

    /// Release the replaced image after a successful write.
    ///
    /// A failure here is reported even though the record is already saved.
    pub async fn commit(&self, store: &dyn ObjectStore) -> Result<()> {
        match self.release_on_commit() {
            Some(key) => release(store, key).await,
            None => Ok(()),
        }
    }

    /// Release the uploaded image after a failed write and return the error
    /// the caller should see
    pub async fn rollback(&self, store: &dyn ObjectStore, cause: AppError) -> AppError {
        let Some(key) = self.release_on_rollback() else {
            return cause;
        };

        match release(store, key).await {
            Ok(()) => cause,
            Err(release_err) => AppError::Storage(format!(
                "{} (the uploaded image could not be released either: {})",
                cause, release_err
            )),
        }
    }
}

/// Delete a blob, logging and normalising any failure to `AppError::Storage`
pub async fn release(store: &dyn ObjectStore, key: &str) -> Result<()> {
    match store.destroy(key).await {
        Ok(()) => {
            tracing::debug!("Released image '{}'", key);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to release image '{}': {}", key, e);
            Err(match e {
                AppError::Storage(msg) => AppError::Storage(msg),
                other => AppError::Storage(format!(
                    "Failed to release image '{}': {}",
                    key, other
                )),
            })
        }
    }
}
