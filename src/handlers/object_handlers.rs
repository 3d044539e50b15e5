//! HTTP handlers for listing folders and issuing presigned URLs.
//! Object bytes never pass through here: callers get a URL and talk to the
//! store directly.

use crate::{errors::AppError, models::entry::Entry, state::AppState};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query params accepted by `GET /objects`.
#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    pub prefix: Option<String>,
}

/// Query params accepted by `GET /download` and `GET /upload`.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Request body for `PUT /upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReq {
    pub key: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListObjectsResp {
    pub items: Vec<Entry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResp {
    pub download_url: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResp {
    pub upload_url: String,
    pub key: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUrlResp {
    pub url: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

/// GET `/objects` — direct children of `?prefix=` (root when omitted).
pub async fn list_objects(
    State(state): State<AppState>,
    Query(q): Query<ListObjectsQuery>,
) -> Result<Json<ListObjectsResp>, AppError> {
    let prefix = q.prefix.unwrap_or_default();
    let items = state
        .resolver
        .resolve(&prefix)
        .await
        .map_err(|err| AppError::from_listing(err, "Failed to fetch objects"))?;

    Ok(Json(ListObjectsResp { items }))
}

/// GET `/download` — presigned GET for `?key=`.
pub async fn download_url(
    State(state): State<AppState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<DownloadResp>, AppError> {
    let key = q.key.unwrap_or_default();
    let grant = state
        .issuer
        .issue_download(&key)
        .await
        .map_err(|err| AppError::from_issue(err, "Failed to generate download URL"))?;

    Ok(Json(DownloadResp {
        download_url: grant.url,
        expires_in: grant.expires_in_seconds,
        expires_at: grant.expires_at,
    }))
}

/// PUT `/upload` — presigned PUT for `{ key, contentType? }`.
pub async fn upload_url(
    State(state): State<AppState>,
    payload: Result<Json<UploadReq>, JsonRejection>,
) -> Result<Json<UploadResp>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let key = req.key.unwrap_or_default();

    let grant = state
        .issuer
        .issue_upload(&key, req.content_type.as_deref())
        .await
        .map_err(|err| AppError::from_issue(err, "Failed to generate upload URL"))?;

    Ok(Json(UploadResp {
        upload_url: grant.url,
        key: grant.key,
        expires_in: grant.expires_in_seconds,
        expires_at: grant.expires_at,
    }))
}

/// GET `/upload` — older download-style issuance kept for existing clients.
///
/// Shares the download issuer, so expiry and error shape match `/download`.
pub async fn legacy_download_url(
    State(state): State<AppState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<LegacyUrlResp>, AppError> {
    let key = q.key.unwrap_or_default();
    let grant = state
        .issuer
        .issue_download(&key)
        .await
        .map_err(|err| AppError::from_issue(err, "Failed to generate download URL"))?;

    Ok(Json(LegacyUrlResp {
        url: grant.url,
        expires_in: grant.expires_in_seconds,
        expires_at: grant.expires_at,
    }))
}
