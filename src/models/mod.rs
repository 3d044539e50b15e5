//! Core data models for the file manager.
//!
//! Nothing here is persisted: entries are rebuilt from the object store on
//! every listing, and presigned operations live for a single request.

pub mod entry;
pub mod presigned;
