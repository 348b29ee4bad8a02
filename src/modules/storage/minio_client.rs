//! MinIO/S3-compatible storage client for report photos.
//!
//! Uses rust-s3 for object operations. Bucket creation is deferred until the
//! first submission needs it, so the server can start without a reachable
//! MinIO instance.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Blob storage operations needed by the submission and cleanup flows.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create the photo bucket with public read access if it does not exist.
    async fn ensure_bucket(&self) -> Result<(), AppError>;

    /// Upload one object under `key`.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError>;

    /// Delete one object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Public download URL for an object key.
    fn public_url(&self, key: &str) -> String;

    fn bucket_name(&self) -> String;
}

/// Anonymous-read policy covering every object in the bucket.
fn public_read_policy(bucket_name: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {"AWS": "*"},
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{bucket_name}/*")]
            }
        ]
    })
}

/// AWS Signature v4 signer for the one call rust-s3 does not cover,
/// PutBucketPolicy.
struct PolicySigner {
    access_key: String,
    secret_key: String,
    region: String,
}

impl PolicySigner {
    /// Authorization header for a `PUT /{bucket}?policy` request.
    fn authorization(
        &self,
        host: &str,
        bucket_name: &str,
        amz_date: &str,
        date_stamp: &str,
        payload_hash: &str,
    ) -> Result<String, AppError> {
        let canonical_request = format!(
            "PUT\n/{bucket_name}\npolicy=\n\
            host:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n\
            {SIGNED_HEADERS}\n{payload_hash}"
        );
        let scope = format!("{date_stamp}/{}/s3/aws4_request", self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        // Signing key chain: date, then region, service and terminator.
        let mut key = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        for part in [self.region.as_str(), "s3", "aws4_request"] {
            key = hmac_sha256(&key, part.as_bytes())?;
        }
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, \
            SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.access_key
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// MinIO/S3-compatible photo storage.
pub struct MinioStorage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    signer: PolicySigner,
    http_client: Client,
}

impl MinioStorage {
    /// Create a new storage client from configuration.
    ///
    /// Does not touch the network; the bucket is created on first use.
    pub fn new(config: StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to build MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to configure bucket: {}", e)))?;
        // MinIO serves path-style URLs (endpoint/bucket), not virtual-host style.
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            signer: PolicySigner {
                access_key: config.access_key,
                secret_key: config.secret_key,
                region: config.region,
            },
            http_client,
        })
    }

    /// Set a public read policy on the whole bucket.
    ///
    /// Photo URLs are embedded in map popups, so every stored object must be
    /// anonymously readable.
    async fn set_public_read_policy(&self) {
        let bucket_name = self.bucket.name();
        let policy = public_read_policy(&bucket_name).to_string();

        match self.put_bucket_policy(&bucket_name, &policy).await {
            Ok(_) => {
                info!("Public read policy set on bucket '{}'", bucket_name);
            }
            Err(e) => {
                // The bucket still works without the policy; photo URLs just 403.
                warn!(
                    "Failed to set public read policy on '{}': {}. \
                    Set it manually with: mc anonymous set download minio/{}",
                    bucket_name, e, bucket_name
                );
            }
        }
    }

    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid MinIO endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("MinIO endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));
        let authorization = self.signer.authorization(
            &host_header,
            bucket_name,
            &amz_date,
            &date_stamp,
            &payload_hash,
        )?;

        let response = self
            .http_client
            .put(format!("{}/{}?policy", self.endpoint, bucket_name))
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Policy request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "PutBucketPolicy returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MinioStorage {
    async fn ensure_bucket(&self) -> Result<(), AppError> {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => {
                info!("Created bucket '{}'", self.bucket.name());
                self.set_public_read_policy().await;
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                // MinIO and AWS word the already-exists case differently.
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    Err(AppError::Internal(format!(
                        "Failed to create bucket '{}': {}",
                        self.bucket.name(),
                        e
                    )))
                }
            }
        }
    }

    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload '{}': {}", key, e)))?;

        if response.status_code() != 200 {
            return Err(AppError::Internal(format!(
                "Upload of '{}' returned status {}",
                key,
                response.status_code()
            )));
        }

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}
