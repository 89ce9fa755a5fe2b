use crate::traits::{PresignedRequest, PutConstraints, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// S3 storage implementation
///
/// Only signs requests; document bytes go straight from the applicant to the bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(region.clone()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(config.region().cloned())
                .retry_config(retry_config);
            if let Some(provider) = config.credentials_provider() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            // Path-style addressing for S3-compatible providers (MinIO, etc.)
            s3_config_builder = s3_config_builder.force_path_style(true);

            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&config)
        };

        tracing::info!(
            bucket = %bucket,
            region = %region,
            custom_endpoint = endpoint_url.is_some(),
            "S3 storage initialized"
        );

        Ok(S3Storage { client, bucket })
    }

    fn presigning_config(expires_in: Duration) -> StorageResult<PresigningConfig> {
        PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| StorageError::PresignFailed(e.to_string()))
    }
}

fn collect_headers<'a>(headers: impl Iterator<Item = (&'a str, &'a str)>) -> BTreeMap<String, String> {
    headers
        .filter(|(name, _)| !name.eq_ignore_ascii_case("host"))
        .map(|(name, value)| (name.to_lowercase(), value.to_string()))
        .collect()
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self, constraints), fields(s3.bucket = %self.bucket, s3.key = %storage_key))]
    async fn presign_put(
        &self,
        storage_key: &str,
        constraints: &PutConstraints,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let content_length = i64::try_from(constraints.content_length).map_err(|_| {
            StorageError::PresignFailed("content length out of range".to_string())
        })?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .content_type(&constraints.content_type)
            .content_length(content_length)
            .checksum_sha256(constraints.checksum_sha256.as_str())
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        tracing::info!(
            size_bytes = constraints.content_length,
            expires_in_secs = expires_in.as_secs(),
            "Generated presigned PUT URL"
        );

        Ok(PresignedRequest {
            url: presigned.uri().to_string(),
            headers: collect_headers(presigned.headers()),
        })
    }

    #[tracing::instrument(skip(self), fields(s3.bucket = %self.bucket, s3.key = %storage_key))]
    async fn presign_get(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(PresignedRequest {
            url: presigned.uri().to_string(),
            headers: collect_headers(presigned.headers()),
        })
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let start = std::time::Instant::now();

        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .send()
            .await;

        let found = match result {
            Ok(_) => true,
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => false,
                    _ => return Err(StorageError::BackendError(e.to_string())),
                },
                _ => return Err(StorageError::BackendError(e.to_string())),
            },
        };

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            found,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 head_object"
        );

        Ok(found)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_headers_drops_host_and_lowercases() {
        let headers = vec![
            ("Host", "bucket.s3.amazonaws.com"),
            ("Content-Type", "application/pdf"),
            ("x-amz-checksum-sha256", "abc="),
        ];
        let collected = collect_headers(headers.into_iter());
        assert_eq!(collected.len(), 2);
        assert_eq!(collected.get("content-type").map(String::as_str), Some("application/pdf"));
        assert!(collected.contains_key("x-amz-checksum-sha256"));
    }
}
