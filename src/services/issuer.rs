//! Issues presigned download and upload URLs.
//!
//! The issuer never touches object data. It only asks the store to sign a
//! single operation with a fixed expiry. Failures are returned as-is; retrying
//! is left to the caller.

use crate::{
    models::presigned::{DownloadGrant, PresignedOperation, UploadGrant, Verb},
    services::store::{ObjectStore, StoreError},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Lifetime of every presigned URL, for downloads and uploads alike.
pub const PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Content type assumed for uploads that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("key is required")]
    MissingKey,
    #[error(transparent)]
    UpstreamUnavailable(#[from] StoreError),
}

pub type IssueResult<T> = Result<T, IssueError>;

#[derive(Clone)]
pub struct PresignIssuer {
    store: Arc<dyn ObjectStore>,
}

impl PresignIssuer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Grant time-bounded read access to `key`.
    pub async fn issue_download(&self, key: &str) -> IssueResult<DownloadGrant> {
        if key.is_empty() {
            return Err(IssueError::MissingKey);
        }

        let op = PresignedOperation {
            verb: Verb::Get,
            key: key.to_string(),
            content_type: None,
            expires_in_seconds: PRESIGN_EXPIRY_SECS,
        };
        let url = self.store.presign(&op).await?;
        info!(key, "issued download url");

        Ok(DownloadGrant {
            url,
            expires_in_seconds: op.expires_in_seconds,
            expires_at: expiry_from_now(op.expires_in_seconds),
        })
    }

    /// Grant time-bounded write access to `key`.
    ///
    /// An absent or empty `content_type` falls back to
    /// [`DEFAULT_CONTENT_TYPE`]. The client must send the same content type
    /// with its upload for the signature to match.
    pub async fn issue_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> IssueResult<UploadGrant> {
        if key.is_empty() {
            return Err(IssueError::MissingKey);
        }
        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let op = PresignedOperation {
            verb: Verb::Put,
            key: key.to_string(),
            content_type: Some(content_type.clone()),
            expires_in_seconds: PRESIGN_EXPIRY_SECS,
        };
        let url = self.store.presign(&op).await?;
        info!(key, content_type = %content_type, "issued upload url");

        Ok(UploadGrant {
            url,
            key: op.key,
            content_type,
            expires_in_seconds: op.expires_in_seconds,
            expires_at: expiry_from_now(op.expires_in_seconds),
        })
    }
}

fn expiry_from_now(seconds: u64) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(seconds as i64)
}
