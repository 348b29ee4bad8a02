//! Storage module for report photos
//!
//! Provides a MinIO/S3-compatible client behind the `ObjectStorage` trait so
//! the submission and cleanup flows can be tested without a live bucket.

mod minio_client;

pub use minio_client::{MinioStorage, ObjectStorage};
