//! Stored image proxy

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{error::AppResult, AppState};

/// Serve an uploaded file by its stored relative path
#[utoipa::path(
    get,
    path = "/uploads/{path}",
    tag = "uploads",
    params(("path" = String, Path, description = "Stored path, e.g. tools/<uuid>.png")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "No such file", body = crate::error::ErrorResponse)
    )
)]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (bytes, content_type) = state.services.storage.read(&path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    ))
}
