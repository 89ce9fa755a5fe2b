//! API constants
//!
//! Routes and OpenAPI annotations are versioned under `/api/v0`.

/// Versioned prefix for every JSON route
pub const API_PREFIX: &str = "/api/v0";

/// Path the OpenAPI document is served at
pub const OPENAPI_PATH: &str = "/api/openapi.json";
