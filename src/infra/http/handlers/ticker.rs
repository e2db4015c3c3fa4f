//! News ticker handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::infra::http::error::ApiError;
use crate::infra::http::state::ApiState;

const SOURCE: &str = "infra::http::ticker";

#[derive(Debug, Deserialize)]
pub struct TickerPayload {
    pub message: String,
}

pub async fn list_ticker(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .ticker
        .list()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(messages))
}

pub async fn create_ticker_message(
    State(state): State<ApiState>,
    Json(payload): Json<TickerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .ticker
        .create(payload.message)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn update_ticker_message(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TickerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .ticker
        .update(id, payload.message)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(message))
}

pub async fn delete_ticker_message(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .ticker
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
