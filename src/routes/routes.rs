//! Defines routes for the file manager API.
//!
//! ## Structure
//! - **Listing**
//!   - `GET /objects?prefix=` — direct children of a folder (root when omitted)
//!
//! - **Presigned URLs**
//!   - `GET /download?key=` — signed GET for one object
//!   - `PUT /upload` — signed PUT for `{ key, contentType? }`
//!   - `GET /upload?key=` — signed GET, kept for older clients
//!
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        object_handlers::{download_url, legacy_download_url, list_objects, upload_url},
    },
    state::AppState,
};
use axum::{Router, routing::get};

/// Build and return the router for the file manager API.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // listing
        .route("/objects", get(list_objects))
        // presigned operations
        .route("/download", get(download_url))
        .route("/upload", get(legacy_download_url).put(upload_url))
}
