//! Shared application state. Both stores are constructed once at startup and
//! injected; handlers hold no other state.

use crate::blob::BlobStore;
use crate::store::ItemStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }
}
