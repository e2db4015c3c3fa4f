//! News handlers (multipart galleries, cached composite reads).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::Multipart;

use crate::infra::http::error::ApiError;
use crate::infra::http::multipart::read_news_form;
use crate::infra::http::state::ApiState;

use super::form_to_api;

const SOURCE: &str = "infra::http::news";

pub async fn list_news(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let summaries = state
        .news
        .list()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(summaries))
}

pub async fn get_news(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .news
        .get(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(item))
}

pub async fn create_news(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let draft = read_news_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let item = state
        .news
        .create(draft)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_news(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let draft = read_news_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let item = state
        .news
        .update(id, draft)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(item))
}

pub async fn delete_news(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .news
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
