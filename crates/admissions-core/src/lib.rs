//! Admissions Core Library
//!
//! This crate provides the domain models, error types, configuration and upload policy
//! shared by the portal API, its storage and database layers, and the submission client.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod models;
pub mod storage_keys;
pub mod storage_types;
pub mod upload_policy;

// Re-export commonly used types
pub use checksum::{compute, compute_reader, IntegrityToken, InvalidIntegrityToken};
pub use config::{BaseConfig, Config, PortalConfig};
pub use display::{select_status_content, StatusAction, StatusContent, StatusInputs, Tone};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_keys::{is_owned_by, object_key, parse_object_key};
pub use storage_types::StorageBackend;
pub use upload_policy::{content_type_for_path, PolicyViolation, UploadPolicy};
