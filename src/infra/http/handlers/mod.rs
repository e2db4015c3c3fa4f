//! HTTP handlers, one module per resource family.

mod chairmen;
mod contacts;
mod news;
mod projects;
mod rates;
mod stream;
mod ticker;
mod uploads;

pub use chairmen::{create_chairman, delete_chairman, list_chairmen, update_chairman};
pub use contacts::{
    contact_stats, delete_contact, get_contact, list_contacts, set_contact_replied, submit_contact,
};
pub use news::{create_news, delete_news, get_news, list_news, update_news};
pub use projects::{create_project, delete_project, get_project, list_projects, update_project};
pub use rates::{create_rate, delete_rate, list_rates, update_rate};
pub use stream::stream;
pub use ticker::{create_ticker_message, delete_ticker_message, list_ticker, update_ticker_message};
pub use uploads::serve_upload;

use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

use alexpetro_api_types::FieldError;

use super::error::ApiError;
use super::multipart::FormError;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("infra::http::fallback", "Not found")
}

pub(super) fn form_to_api(source: &'static str, error: FormError) -> ApiError {
    match error {
        FormError::UnknownField(field) => ApiError::validation(
            source,
            vec![FieldError {
                field,
                message: "unknown field".to_string(),
            }],
        ),
        FormError::Read(detail) => ApiError::new(
            source,
            axum::http::StatusCode::BAD_REQUEST,
            "Invalid form data",
            detail,
        ),
    }
}
