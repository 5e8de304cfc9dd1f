pub mod activity;
pub mod files;
pub mod items;

use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use serde_json::{Map, Value};

/// `Json` wrapper whose rejection is translated into `AppError`, so a
/// malformed body comes back in the same JSON error envelope as every other
/// failure instead of axum's plain-text rejection.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;
        Ok(AppJson(value))
    }
}

pub(crate) fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::InvalidBody("body must be a JSON object".into())),
    }
}
