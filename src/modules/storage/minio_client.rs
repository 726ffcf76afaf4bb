//! MinIO/S3-compatible image store
//!
//! Uses rust-s3 for object operations. Bucket policy is set with a hand-signed
//! (AWS Signature v4) request because rust-s3 has no policy API.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::object_store::{ObjectStore, StoredImage, UploadedImage};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    image_root: String,
    access_key: String,
    secret_key: String,
    region_name: String,
    http_client: Client,
}

impl MinIOClient {
    /// Create a new client, making sure the bucket exists and the image root
    /// is publicly readable
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            image_root: config.image_root,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        };

        client.ensure_bucket_exists().await?;
        client.set_public_read_policy().await?;

        info!(
            "MinIO image store initialized for endpoint: {}, bucket: {}, image_root: {}",
            client.endpoint,
            client.bucket.name(),
            client.image_root
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    async fn ensure_bucket_exists(&self) -> Result<()> {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    /// Allow anonymous reads below the image root so image URLs work in browsers
    async fn set_public_read_policy(&self) -> Result<()> {
        let bucket_name = self.bucket.name();

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{}/{}/*", bucket_name, self.image_root)]
                }
            ]
        })
        .to_string();

        match self.put_bucket_policy(&bucket_name, &policy).await {
            Ok(_) => {
                info!(
                    "Set public read policy for {}/{}/*",
                    bucket_name, self.image_root
                );
            }
            Err(e) => {
                // Startup continues; the policy can be set manually
                warn!(
                    "Failed to set bucket policy for '{}': {}. \
                    Set it manually with: mc anonymous set download minio/{}/{}",
                    bucket_name, e, bucket_name, self.image_root
                );
            }
        }

        Ok(())
    }

    /// PUT ?policy signed with AWS Signature v4
    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<()> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        let url = format!(
            "{}/{}?policy",
            self.endpoint.trim_end_matches('/'),
            bucket_name
        );
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_request = format!(
            "PUT\n/{}\npolicy=\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            bucket_name, host_header, payload_hash, amz_date, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = self.sign(&date_stamp, &string_to_sign)?;
        let authorization_header = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Internal(format!(
            "Failed to set bucket policy: {} - {}",
            status, body
        )))
    }

    /// Derive the SigV4 signing key and sign `string_to_sign`
    fn sign(&self, date_stamp: &str, string_to_sign: &str) -> Result<String> {
        let k_date = Self::hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = Self::hmac_sha256(&k_date, self.region_name.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, b"s3")?;
        let k_signing = Self::hmac_sha256(&k_service, b"aws4_request")?;

        Ok(hex::encode(Self::hmac_sha256(
            &k_signing,
            string_to_sign.as_bytes(),
        )?))
    }

    fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Object key for a new image: `{image_root}/{folder}/{uuid}.{ext}`
    fn image_key(&self, folder: &str, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.image_root,
            folder.trim_matches('/'),
            Uuid::now_v7(),
            extension
        )
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// rust-s3 without `fail-on-err` hands back non-2xx responses as Ok
    fn check_status(status: u16, action: &str, key: &str) -> Result<()> {
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(AppError::Storage(format!(
                "Failed to {} image '{}': storage responded with status {}",
                action, key, status
            )))
        }
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn upload(&self, folder: &str, image: UploadedImage) -> Result<StoredImage> {
        let key = self.image_key(folder, image.extension());

        let response = self
            .bucket
            .put_object_with_content_type(&key, &image.data, &image.content_type)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to upload image '{}': {}",
                    image.file_name, e
                ))
            })?;
        Self::check_status(response.status_code(), "upload", &key)?;

        debug!(
            "Uploaded image '{}' as '{}' to bucket '{}'",
            image.file_name,
            key,
            self.bucket.name()
        );

        Ok(StoredImage {
            url: self.public_url(&key),
            key,
        })
    }

    async fn destroy(&self, key: &str) -> Result<()> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete image '{}': {}", key, e)))?;
        Self::check_status(response.status_code(), "delete", key)?;

        debug!("Deleted image '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}
