//! src/services/store.rs
//!
//! The seam between the file manager and the bucket it fronts. Everything the
//! rest of the crate needs from the store goes through [`ObjectStore`]: one
//! listing call, one signing call, and a reachability probe. [`S3Store`] is the
//! production implementation on top of `aws-sdk-s3`.

use crate::models::presigned::{PresignedOperation, Verb};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client as S3Client,
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
    presigning::PresigningConfig,
};
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::debug;

/// One object returned by a listing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// Raw result of a single ListObjectsV2-style call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    #[error("presign request rejected: {0}")]
    InvalidPresign(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the file manager needs from the object store.
///
/// Implementations must not mutate the bucket: listing and signing are both
/// read-only with respect to stored objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List keys beginning with `prefix`. With a delimiter, keys sharing a
    /// segment past the prefix are grouped into `common_prefixes`.
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StoreResult<ListPage>;

    /// Sign `op` and return the resulting URL.
    async fn presign(&self, op: &PresignedOperation) -> StoreResult<String>;

    /// Check that the bucket is reachable with the configured credentials.
    async fn probe(&self) -> StoreResult<()>;
}

/// Connection settings for [`S3Store`].
#[derive(Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible stores. Enables path-style addressing.
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// [`ObjectStore`] backed by one AWS S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "s3-file-manager",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = settings.endpoint.as_deref() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> StoreResult<ListPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix);
        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }

        let output = request
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(DisplayErrorContext(err).to_string()))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|item| {
                item.key().map(|key| ObjectSummary {
                    key: key.to_string(),
                    size: item.size().unwrap_or(0).max(0) as u64,
                })
            })
            .collect::<Vec<_>>();

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect::<Vec<_>>();

        debug!(
            bucket = %self.bucket,
            prefix,
            objects = objects.len(),
            prefixes = common_prefixes.len(),
            truncated = output.is_truncated().unwrap_or(false),
            "listed objects"
        );

        Ok(ListPage {
            objects,
            common_prefixes,
        })
    }

    async fn presign(&self, op: &PresignedOperation) -> StoreResult<String> {
        let config = PresigningConfig::expires_in(Duration::from_secs(op.expires_in_seconds))
            .map_err(|err| StoreError::InvalidPresign(err.to_string()))?;

        let request = match op.verb {
            Verb::Get => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&op.key)
                .presigned(config)
                .await
                .map_err(|err| StoreError::Unavailable(DisplayErrorContext(err).to_string()))?,
            Verb::Put => {
                let mut put = self.client.put_object().bucket(&self.bucket).key(&op.key);
                if let Some(content_type) = op.content_type.as_deref() {
                    put = put.content_type(content_type);
                }
                put.presigned(config)
                    .await
                    .map_err(|err| StoreError::Unavailable(DisplayErrorContext(err).to_string()))?
            }
        };

        debug!(verb = %op.verb, key = %op.key, "presigned request");
        Ok(request.uri().to_string())
    }

    async fn probe(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(DisplayErrorContext(err).to_string()))?;
        Ok(())
    }
}
