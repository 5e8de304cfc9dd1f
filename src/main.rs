//! Server entrypoint: reads env config, connects the document store, picks
//! the blob backend, and mounts common + api routes.

use aws_config::{BehaviorVersion, Region};
use axum::Router;
use stash_server::{
    api_routes, common_routes, AppState, BlobStore, LocalBlobStore, PgStore, S3BlobStore,
    ServerConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stash_server=info".parse()?))
        .init();

    let config = ServerConfig::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(45))
        .connect(&config.database_url)
        .await?;
    let store = PgStore::new(pool);
    store.ensure_collections().await?;

    let blobs: Arc<dyn BlobStore> = match &config.storage {
        Some(storage) => {
            let sdk = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(storage.region.clone()))
                .load()
                .await;
            Arc::new(S3BlobStore::new(
                aws_sdk_s3::Client::new(&sdk),
                storage.bucket.clone(),
                storage.region.clone(),
            ))
        }
        None => {
            tracing::warn!(
                dir = %config.upload_dir.display(),
                "object storage unconfigured; uploads fall back to local scratch directory"
            );
            Arc::new(LocalBlobStore::new(config.upload_dir.clone()))
        }
    };

    let state = AppState::new(Arc::new(store), blobs);
    let app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
