//! Storage module for catalogue images
//!
//! `ObjectStore` is the seam the services talk to; `MinIOClient` is the
//! MinIO/S3-compatible implementation used in production.

mod minio_client;
mod object_store;

pub use minio_client::MinIOClient;
pub use object_store::{ObjectStore, StoredImage, UploadedImage, MAX_IMAGE_SIZE};
