//! Stash server: REST backend persisting heterogeneous item collections,
//! with file blobs offloaded to object storage.

pub mod blob;
pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod state;
pub mod store;

pub use blob::{BlobStore, LocalBlobStore, S3BlobStore, StoredObject, DEFAULT_SIGNED_URL_TTL};
pub use config::{ServerConfig, StorageConfig, MAX_UPLOAD_BYTES};
pub use error::AppError;
pub use registry::{CodeKind, ItemKind, ACTIVITY_COLLECTION, ACTIVITY_LIMIT};
pub use routes::{api_routes, common_routes};
pub use state::AppState;
pub use store::{new_item_id, ItemStore, MemoryStore, PgStore};
