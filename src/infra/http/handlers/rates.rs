//! Sharing-rate handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::content::rates::RateInput;
use crate::infra::http::error::ApiError;
use crate::infra::http::state::ApiState;

const SOURCE: &str = "infra::http::rates";

#[derive(Debug, Deserialize)]
pub struct RatePayload {
    pub title: String,
    pub percentage: f64,
}

pub async fn list_rates(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let rates = state
        .rates
        .list()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(rates))
}

pub async fn create_rate(
    State(state): State<ApiState>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let rate = state
        .rates
        .create(RateInput {
            title: payload.title,
            percentage: payload.percentage,
        })
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(rate)))
}

pub async fn update_rate(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let rate = state
        .rates
        .update(
            id,
            RateInput {
                title: payload.title,
                percentage: payload.percentage,
            },
        )
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(rate))
}

pub async fn delete_rate(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .rates
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
