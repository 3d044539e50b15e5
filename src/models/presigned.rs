//! Presigned operations and the grants handed back to callers.

use chrono::{DateTime, Utc};
use std::fmt;

/// HTTP verb a presigned URL authorizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Get => write!(f, "GET"),
            Verb::Put => write!(f, "PUT"),
        }
    }
}

/// A request for one time-bounded capability on one object.
///
/// Built on demand by the issuer, handed to the store for signing, then
/// discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignedOperation {
    pub verb: Verb,
    pub key: String,
    /// Content type the upload must be sent with. Only meaningful for `Put`.
    pub content_type: Option<String>,
    pub expires_in_seconds: u64,
}

/// Signed URL allowing the client to fetch one object directly.
#[derive(Clone, Debug)]
pub struct DownloadGrant {
    pub url: String,
    pub expires_in_seconds: u64,
    pub expires_at: DateTime<Utc>,
}

/// Signed URL allowing the client to write one object directly.
#[derive(Clone, Debug)]
pub struct UploadGrant {
    pub url: String,
    /// The key the upload will land at, echoed unchanged.
    pub key: String,
    pub content_type: String,
    pub expires_in_seconds: u64,
    pub expires_at: DateTime<Utc>,
}
