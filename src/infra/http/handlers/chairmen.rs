//! Chairman handlers (multipart: optional portrait upload or URL).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::Multipart;

use crate::infra::http::error::ApiError;
use crate::infra::http::multipart::read_chairman_form;
use crate::infra::http::state::ApiState;

use super::form_to_api;

const SOURCE: &str = "infra::http::chairmen";

pub async fn list_chairmen(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let chairmen = state
        .chairmen
        .list()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(chairmen))
}

pub async fn create_chairman(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_chairman_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let chairman = state
        .chairmen
        .create(input)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(chairman)))
}

pub async fn update_chairman(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_chairman_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let chairman = state
        .chairmen
        .update(id, input)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(chairman))
}

pub async fn delete_chairman(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .chairmen
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
