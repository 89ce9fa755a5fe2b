//! Configuration module
//!
//! Environment-driven configuration for the portal API: server, database, identity,
//! object storage and upload policy settings.

use std::env;

use crate::constants::{
    ACCEPTED_CONTENT_TYPES, MAX_UPLOAD_SIZE_BYTES, READ_URL_TTL_SECS, UPLOAD_URL_TTL_SECS,
};
use crate::storage_types::StorageBackend;
use crate::upload_policy::UploadPolicy;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MIN_SECRET_LEN: usize = 32;
// Longest lifetime S3 accepts for a presigned URL
const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 3600;

/// Base configuration shared by every service binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Portal API configuration
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base: BaseConfig,
    /// `postgresql://...` or `memory://`
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_signing_secret: Option<String>,
    // Upload policy
    pub max_upload_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub upload_url_ttl_secs: u64,
    pub read_url_ttl_secs: u64,
}

/// Application configuration (portal API).
#[derive(Clone, Debug)]
pub struct Config(pub Box<PortalConfig>);

impl Config {
    fn as_portal(&self) -> &PortalConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_portal().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PortalConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_portal().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_portal().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_portal().base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_portal().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_portal().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_portal().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_portal().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.as_portal().database_url
    }

    pub fn is_memory_database(&self) -> bool {
        self.as_portal().database_url.starts_with("memory://")
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_portal().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_portal().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_portal().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_portal().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_portal().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_portal().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_portal().local_storage_base_url.as_deref()
    }

    /// Falls back to the JWT secret when no dedicated signing secret is set.
    pub fn local_storage_signing_secret(&self) -> &str {
        self.as_portal()
            .local_storage_signing_secret
            .as_deref()
            .unwrap_or(&self.as_portal().base.jwt_secret)
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.as_portal().max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_portal().allowed_content_types
    }

    pub fn upload_url_ttl_secs(&self) -> u64 {
        self.as_portal().upload_url_ttl_secs
    }

    pub fn read_url_ttl_secs(&self) -> u64 {
        self.as_portal().read_url_ttl_secs
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.as_portal().allowed_content_types.clone(),
            self.as_portal().max_upload_size_bytes,
        )
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());

        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let allowed_content_types = var("ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                ACCEPTED_CONTENT_TYPES
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect()
            });

        let config = PortalConfig {
            base,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: var("S3_BUCKET").filter(|s| !s.is_empty()),
            s3_region: var("S3_REGION").filter(|s| !s.is_empty()),
            s3_endpoint: var("S3_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: var("AWS_REGION").filter(|s| !s.is_empty()),
            local_storage_path: var("LOCAL_STORAGE_PATH").filter(|s| !s.is_empty()),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            local_storage_signing_secret: var("LOCAL_STORAGE_SIGNING_SECRET")
                .filter(|s| !s.is_empty()),
            max_upload_size_bytes: var("MAX_UPLOAD_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_SIZE_BYTES),
            allowed_content_types,
            upload_url_ttl_secs: var("UPLOAD_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(UPLOAD_URL_TTL_SECS),
            read_url_ttl_secs: var("READ_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(READ_URL_TTL_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("memory://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a PostgreSQL connection string or memory://"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_BYTES must be positive"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        for (name, ttl) in [
            ("UPLOAD_URL_TTL_SECS", self.upload_url_ttl_secs),
            ("READ_URL_TTL_SECS", self.read_url_ttl_secs),
        ] {
            if ttl == 0 || ttl > MAX_PRESIGN_TTL_SECS {
                return Err(anyhow::anyhow!(
                    "{} must be between 1 and {} seconds",
                    name,
                    MAX_PRESIGN_TTL_SECS
                ));
            }
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if let Some(secret) = &self.local_storage_signing_secret {
                    if secret.len() < MIN_SECRET_LEN {
                        return Err(anyhow::anyhow!(
                            "LOCAL_STORAGE_SIGNING_SECRET must be at least 32 characters long"
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PortalConfig::from_lookup(|key| map.get(key).cloned()).map(|c| Config(Box::new(c)))
    }

    fn local_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "memory://"),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/admissions"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:4000/"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&local_vars()).unwrap();
        assert_eq!(config.server_port(), 4000);
        assert_eq!(config.max_upload_size_bytes(), 15_728_640);
        assert_eq!(config.upload_url_ttl_secs(), 60);
        assert_eq!(config.read_url_ttl_secs(), 3600);
        assert_eq!(config.allowed_content_types().len(), ACCEPTED_CONTENT_TYPES.len());
        assert!(config.is_memory_database());
        assert_eq!(config.local_storage_base_url(), Some("http://localhost:4000"));
        assert_eq!(config.local_storage_signing_secret(), SECRET);
        assert!(!config.is_production());
    }

    #[test]
    fn test_requires_jwt_secret_length() {
        let mut vars = local_vars();
        vars[0] = ("JWT_SECRET", "short");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_rejects_unknown_database_scheme() {
        let mut vars = local_vars();
        vars[1] = ("DATABASE_URL", "mysql://localhost/db");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let vars = vec![("JWT_SECRET", SECRET), ("DATABASE_URL", "memory://")];
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let mut vars = vars;
        vars.push(("S3_BUCKET", "admissions"));
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));

        vars.push(("AWS_REGION", "eu-west-3"));
        let config = load(&vars).unwrap();
        assert_eq!(config.storage_backend(), StorageBackend::S3);
        assert_eq!(config.s3_bucket(), Some("admissions"));
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let mut vars = local_vars();
        vars.push(("ENVIRONMENT", "production"));
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("CORS_ORIGINS"));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let mut vars = local_vars();
        vars.push(("UPLOAD_URL_TTL_SECS", "0"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_upload_policy_from_config() {
        let mut vars = local_vars();
        vars.push(("ALLOWED_CONTENT_TYPES", "application/pdf, IMAGE/PNG"));
        vars.push(("MAX_UPLOAD_SIZE_BYTES", "1024"));
        let policy = load(&vars).unwrap().upload_policy();
        assert_eq!(policy.allowed_content_types(), &["application/pdf", "image/png"]);
        assert_eq!(policy.max_size_bytes(), 1024);
    }
}
