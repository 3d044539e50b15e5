//! Shared state handed to every handler.

use crate::services::{
    issuer::PresignIssuer, listing::ListingResolver, store::ObjectStore,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub resolver: ListingResolver,
    pub issuer: PresignIssuer,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            resolver: ListingResolver::new(store.clone()),
            issuer: PresignIssuer::new(store.clone()),
            store,
        }
    }
}
