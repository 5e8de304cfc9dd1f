//! File upload and download: multipart bytes go to the blob store, only
//! metadata ever reaches the collection store.

use crate::blob::DEFAULT_SIGNED_URL_TTL;
use crate::error::AppError;
use crate::registry::ItemKind;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    Json,
};
use serde_json::{Map, Value};

/// POST /api/files/upload: multipart form with a `file` field and optional
/// `title` / `description`. The blob is stored first; the metadata record is
/// only created after a successful store, so a failed upload never leaves an
/// orphan record.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let mut file: Option<(Vec<u8>, String, Option<String>)> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let originalname = field.file_name().unwrap_or("upload").to_string();
                let mimetype = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
                file = Some((bytes.to_vec(), originalname, mimetype));
            }
            "title" => title = Some(field.text().await.map_err(|e| AppError::Upload(e.to_string()))?),
            "description" => {
                description = Some(field.text().await.map_err(|e| AppError::Upload(e.to_string()))?)
            }
            _ => {}
        }
    }

    let (bytes, originalname, mimetype) =
        file.ok_or_else(|| AppError::Upload("missing 'file' field in multipart body".into()))?;
    let size = bytes.len();
    let stored = state
        .blobs
        .put_object(bytes, &originalname, mimetype.as_deref())
        .await?;

    let mut fields = Map::new();
    fields.insert(
        "title".into(),
        Value::String(
            title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| originalname.clone()),
        ),
    );
    fields.insert(
        "description".into(),
        Value::String(description.unwrap_or_default()),
    );
    fields.insert("filename".into(), Value::String(stored.key));
    fields.insert("originalname".into(), Value::String(originalname));
    fields.insert("path".into(), Value::String(stored.location));
    fields.insert(
        "mimetype".into(),
        Value::String(mimetype.unwrap_or_else(|| "application/octet-stream".into())),
    );
    fields.insert("size".into(), Value::Number(size.into()));

    let doc = state
        .store
        .create(ItemKind::Files.collection(), fields, None)
        .await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// GET /api/files/download/:id: 302 redirect to a time-limited signed URL.
/// Never proxies object bytes itself.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let record = state
        .store
        .get_by_id(ItemKind::Files.collection(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    let key = record
        .get("filename")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Storage(format!("file record {} has no storage key", id)))?;
    let url = state.blobs.signed_get_url(key, DEFAULT_SIGNED_URL_TTL).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}
