//! Browser file manager for a single object-store bucket.
//!
//! The server lists folders over a flat, `/`-delimited key space and hands out
//! short-lived presigned URLs, so object bytes travel directly between the
//! browser and the store.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
