//! Activity log handlers. Fixed routes, matched ahead of the generic
//! catch-alls so a type named "activity" could never shadow them.

use crate::error::AppError;
use crate::handlers::{body_to_map, AppJson};
use crate::registry::{ACTIVITY_COLLECTION, ACTIVITY_LIMIT};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

/// GET /api/activity: the 20 most recent entries, newest first.
pub async fn list(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let rows = state
        .store
        .recent(ACTIVITY_COLLECTION, ACTIVITY_LIMIT)
        .await?;
    Ok((StatusCode::OK, Json(rows)))
}

/// POST /api/activity: append one entry (action, itemType, itemName).
pub async fn append(
    State(state): State<AppState>,
    AppJson(body): AppJson<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let fields = body_to_map(body)?;
    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let doc = state.store.create(ACTIVITY_COLLECTION, fields, id).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// DELETE /api/activity: wipe the whole log unconditionally.
pub async fn clear(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let removed = state.store.clear(ACTIVITY_COLLECTION).await?;
    tracing::debug!(removed, "activity log cleared");
    Ok(StatusCode::NO_CONTENT)
}
