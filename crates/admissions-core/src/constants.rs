//! Portal-wide constants shared by the server and the client workflow.

/// Largest object the broker will authorize (15 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 15 * 1024 * 1024;

/// Lifetime of a write authorization. Clients request it right before transferring.
pub const UPLOAD_URL_TTL_SECS: u64 = 60;

/// Lifetime of a read authorization.
pub const READ_URL_TTL_SECS: u64 = 3600;

/// MIME types accepted for application documents and reports.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
];

/// Settings key for the submissions gate.
pub const APPLICATIONS_OPEN_SETTING: &str = "applications-open";

/// Header carrying the base64 SHA-256 checksum bound into write authorizations.
pub const CHECKSUM_HEADER: &str = "x-amz-checksum-sha256";

/// Prefix of every deterministic object key.
pub const OBJECT_KEY_PREFIX: &str = "applications";
