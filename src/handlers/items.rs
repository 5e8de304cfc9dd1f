//! Generic CRUD handlers: one set of operations serving every registered
//! item kind, in both the flat `/{kind}` and nested `/codes/{subtype}` forms.

use crate::error::AppError;
use crate::handlers::{body_to_map, AppJson};
use crate::registry::{CodeKind, ItemKind};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

async fn list_kind(state: &AppState, kind: ItemKind) -> Result<(StatusCode, Json<Vec<Value>>), AppError> {
    let rows = state.store.list_all(kind.collection()).await?;
    Ok((StatusCode::OK, Json(rows)))
}

async fn create_kind(
    state: &AppState,
    kind: ItemKind,
    body: Value,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let fields = body_to_map(body)?;
    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let doc = state.store.create(kind.collection(), fields, id).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn update_kind(
    state: &AppState,
    kind: ItemKind,
    id: String,
    body: Value,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patch: Map<String, Value> = body_to_map(body)?;
    let doc = state
        .store
        .update_by_id(kind.collection(), &id, patch)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok((StatusCode::OK, Json(doc)))
}

async fn delete_kind(state: &AppState, kind: ItemKind, id: String) -> Result<StatusCode, AppError> {
    if kind == ItemKind::Files {
        let record = state
            .store
            .get_by_id(kind.collection(), &id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.clone()))?;
        // Object first, record second. A failed object delete is logged and
        // never blocks the record delete; an orphaned blob beats a blocked
        // user-visible delete.
        if let Some(key) = record.get("filename").and_then(Value::as_str) {
            if let Err(e) = state.blobs.delete_object(key).await {
                tracing::warn!(id = %id, key = %key, error = %e, "object delete failed, removing record anyway");
            }
        }
    }
    let deleted = state.store.delete_by_id(kind.collection(), &id).await?;
    if !deleted {
        return Err(AppError::NotFound(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Flat form: /api/{kind}

pub async fn list(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::from_token(&token)?;
    list_kind(&state, kind).await
}

pub async fn create(
    State(state): State<AppState>,
    Path(token): Path<String>,
    AppJson(body): AppJson<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::from_token(&token)?;
    create_kind(&state, kind, body).await
}

pub async fn update(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, String)>,
    AppJson(body): AppJson<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::from_token(&token)?;
    update_kind(&state, kind, id, body).await
}

pub async fn delete(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::from_token(&token)?;
    delete_kind(&state, kind, id).await
}

// Nested form: /api/codes/{subtype}

pub async fn list_code(
    State(state): State<AppState>,
    Path(subtype): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::Code(CodeKind::from_token(&subtype)?);
    list_kind(&state, kind).await
}

pub async fn create_code(
    State(state): State<AppState>,
    Path(subtype): Path<String>,
    AppJson(body): AppJson<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::Code(CodeKind::from_token(&subtype)?);
    create_kind(&state, kind, body).await
}

pub async fn update_code(
    State(state): State<AppState>,
    Path((subtype, id)): Path<(String, String)>,
    AppJson(body): AppJson<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::Code(CodeKind::from_token(&subtype)?);
    update_kind(&state, kind, id, body).await
}

pub async fn delete_code(
    State(state): State<AppState>,
    Path((subtype, id)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind = ItemKind::Code(CodeKind::from_token(&subtype)?);
    delete_kind(&state, kind, id).await
}
