//! Listing, signing, and tree navigation over a single bucket.

pub mod issuer;
pub mod listing;
#[cfg(test)]
pub mod memory_store;
pub mod navigator;
pub mod store;
