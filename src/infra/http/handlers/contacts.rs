//! Contact submission and the admin inbox.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use alexpetro_api_types::{DataEnvelope, MessageEnvelope};

use crate::application::content::contacts::ContactInput;
use crate::application::repos::ContactQueryFilter;
use crate::infra::http::error::ApiError;
use crate::infra::http::middleware::client_ip;
use crate::infra::http::state::ApiState;
use crate::infra::recaptcha::RecaptchaError;

const SOURCE: &str = "infra::http::contacts";
const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmitPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub recaptcha_token: Option<String>,
}

pub async fn submit_contact(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<ContactSubmitPayload>,
) -> Result<Response, ApiError> {
    let source_ip = client_ip(&headers);

    let (allowed, _remaining) = state.submit_limiter.allow(&source_ip);
    if !allowed {
        counter!("alexpetro_contact_rate_limited_total").increment(1);
        warn!(
            target = "alexpetro::http::contacts",
            ip = %source_ip,
            "contact submission rate limit exceeded"
        );
        return Ok(ApiError::rate_limited(state.submit_limiter.retry_after_secs()));
    }

    if state.recaptcha.is_enabled() {
        if let Some(token) = payload.recaptcha_token.as_deref() {
            match state.recaptcha.verify(token, Some(&source_ip)).await {
                Ok(()) => {}
                Err(RecaptchaError::Rejected { .. }) => {
                    return Err(ApiError::new(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "reCAPTCHA verification failed. Please try again.",
                        "recaptcha token rejected",
                    ));
                }
                Err(RecaptchaError::Transport(detail)) => {
                    return Err(ApiError::new(
                        SOURCE,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to verify reCAPTCHA. Please try again.",
                        detail,
                    ));
                }
            }
        }
    }

    let receipt = state
        .contacts
        .submit(ContactInput {
            name: payload.name,
            email: payload.email,
            subject: payload.subject,
            message: payload.message,
        })
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Your message has been sent successfully!",
            "data": receipt,
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub search: Option<String>,
    pub is_replied: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_contacts(
    State(state): State<ApiState>,
    axum::extract::Query(query): axum::extract::Query<ContactListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let is_replied = match query.is_replied.as_deref() {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            return Err(ApiError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Validation failed",
                format!("is_replied must be `true` or `false`, got `{other}`"),
            ));
        }
    };

    let contacts = state
        .contacts
        .list(ContactQueryFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            is_replied,
            limit: query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            offset: query.offset.unwrap_or(0),
        })
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;

    Ok(Json(DataEnvelope::new(contacts)))
}

pub async fn get_contact(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = state
        .contacts
        .get(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(DataEnvelope::new(contact)))
}

#[derive(Debug, Deserialize)]
pub struct RepliedPayload {
    pub is_replied: bool,
}

pub async fn set_contact_replied(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<RepliedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .contacts
        .set_replied(id, payload.is_replied)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;

    let status = if payload.is_replied { "replied" } else { "unreplied" };
    Ok(Json(MessageEnvelope {
        success: true,
        message: format!("Contact marked as {status}"),
    }))
}

pub async fn delete_contact(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .contacts
        .delete(id)
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(MessageEnvelope {
        success: true,
        message: "Contact deleted successfully".to_string(),
    }))
}

pub async fn contact_stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .contacts
        .stats()
        .await
        .map_err(|err| ApiError::from_content(SOURCE, err))?;
    Ok(Json(DataEnvelope::new(stats)))
}
