//! Serves stored upload files back to the site.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::infra::http::error::ApiError;
use crate::infra::http::state::ApiState;
use crate::infra::uploads::UploadStorageError;

const SOURCE: &str = "infra::http::uploads";

pub async fn serve_upload(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    match state.storage.read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Ok((
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                bytes,
            )
                .into_response())
        }
        Err(UploadStorageError::InvalidPath) => Err(ApiError::not_found(SOURCE, "Not found")),
        Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found(SOURCE, "Not found"))
        }
        Err(err) => Err(ApiError::internal(SOURCE, err.to_string())),
    }
}
