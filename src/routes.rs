//! Router assembly.
//!
//! Route precedence matters: the fixed activity routes and the two file
//! routes are literal paths, which axum matches ahead of the `/:kind`
//! captures, so the generic handlers never see them. The flat `/:kind` and
//! nested `/codes/:subtype` forms resolve through the same registry.

use crate::config::MAX_UPLOAD_BYTES;
use crate::handlers::{activity, files, items};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;

/// All /api routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/activity",
            get(activity::list)
                .post(activity::append)
                .delete(activity::clear),
        )
        .route("/files/upload", post(files::upload))
        .route("/files/download/:id", get(files::download))
        .route(
            "/codes/:subtype",
            get(items::list_code).post(items::create_code),
        )
        .route(
            "/codes/:subtype/:id",
            put(items::update_code).delete(items::delete_code),
        )
        .route("/:kind", get(items::list).post(items::create))
        .route("/:kind/:id", put(items::update).delete(items::delete))
        // Uploads are bounded at 50 MiB; axum's 2 MiB default would reject
        // them first, so it is disabled in favor of the explicit layer.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadyBody>, (axum::http::StatusCode, Json<ReadyBody>)> {
    if state.store.ping().await.is_err() {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

/// Common routes: GET /health, GET /ready (store liveness check).
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}
