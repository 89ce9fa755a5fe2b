//! Admissions portal HTTP API.
//!
//! Issues presigned upload and read URLs, records committed document references and
//! review status, and serves the applications gate. Document bytes never pass through
//! this service when the S3 backend is used.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::ErrorResponse;
