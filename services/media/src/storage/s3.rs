use std::time::Instant;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{error, info};

use super::AssetStorage;
use crate::error::{StorageError, StorageResult};
use crate::models::MediaType;
use crate::staging::StagedUpload;

/// S3 (or S3-compatible) object storage
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// Credentials come from the default AWS provider chain.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g. "http://localhost:9000" for MinIO); requests then use path-style
    ///   addressing
    pub async fn new(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::with_client(Client::from_conf(builder.build()), bucket, region, endpoint_url)
    }

    /// Wrap an already configured client
    pub fn with_client(
        client: Client,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket,
            region,
            endpoint_url,
        }
    }

    /// Public URL for an object key
    pub fn locator(&self, key: &str) -> String {
        object_url(&self.bucket, &self.region, self.endpoint_url.as_deref(), key)
    }
}

/// `https://{bucket}.s3.{region}.amazonaws.com/{key}` for AWS, or
/// `{endpoint}/{bucket}/{key}` for a custom endpoint
pub fn object_url(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl AssetStorage for S3Storage {
    async fn commit(
        &self,
        key: &str,
        media_type: &MediaType,
        staged: &mut StagedUpload,
    ) -> StorageResult<String> {
        let size = staged.len();
        let start = Instant::now();

        let body = ByteStream::from_path(staged.path())
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to open staged upload: {}", e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(media_type.essence())
            .content_length(size as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(DisplayErrorContext(&e).to_string())
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.locator(key))
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
