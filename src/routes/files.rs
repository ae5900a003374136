use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::uploads;

/// GET /uploads/{file} — serve an uploaded image from the file store.
pub async fn serve(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> AppResult<Response> {
    if !uploads::is_safe_name(&file_name) {
        return Err(AppError::NotFound);
    }

    let path = state.config.uploads_path().join(&file_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        bytes,
    )
        .into_response())
}
