//! Admissions Storage Library
//!
//! Storage abstraction for application documents, with an S3 backend that mints
//! presigned requests and a local filesystem backend for development and tests.
//!
//! # Storage key format
//!
//! `applications/{owner_id}/{slot}`. Keys must not contain `..` or a leading `/`.
//! Key generation lives in `admissions_core::storage_keys` so every layer agrees.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use admissions_core::StorageBackend;
pub use factory::{create_storage, ConfiguredStorage};
#[cfg(feature = "storage-local")]
pub use local::{parse_signed_query, LocalStorage, SignedQuery, LOCAL_OBJECTS_ROUTE};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{PresignedRequest, PutConstraints, Storage, StorageError, StorageResult};
