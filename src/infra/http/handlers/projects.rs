//! Project handlers (multipart galleries and details, cached composite reads).

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::Multipart;
use serde::Deserialize;

use crate::infra::http::error::ApiError;
use crate::infra::http::multipart::read_project_form;
use crate::infra::http::state::ApiState;

use super::form_to_api;

const SOURCE: &str = "infra::http::projects";

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub category: Option<String>,
}

pub async fn list_projects(
    State(state): State<ApiState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = state
        .projects
        .list(query.category)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .get(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(project))
}

pub async fn create_project(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let draft = read_project_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let project = state
        .projects
        .create(draft)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let draft = read_project_form(&mut multipart)
        .await
        .map_err(|err| form_to_api(SOURCE, err))?;

    let project = state
        .projects
        .update(id, draft)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .projects
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(StatusCode::NO_CONTENT)
}
