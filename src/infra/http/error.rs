//! JSON error envelope and the structured report consumed by the logging
//! middleware.

use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use alexpetro_api_types::{ErrorBody, FieldError};

use crate::application::content::ContentError;

/// Diagnostic detail attached to a response as an extension so the shared
/// logging middleware can emit the full error chain without leaking it to the
/// caller.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Error half of the `{success:false, message, errors?}` envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldError>>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            message,
            errors: None,
            report,
        }
    }

    pub fn validation(source: &'static str, errors: Vec<FieldError>) -> Self {
        let detail = errors
            .iter()
            .map(|err| format!("{}: {}", err.field, err.message))
            .collect::<Vec<_>>()
            .join("; ");
        let report = ErrorReport::from_message(source, StatusCode::BAD_REQUEST, detail);
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: Some(errors),
            report,
        }
    }

    pub fn not_found(source: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(source, StatusCode::NOT_FOUND, message.clone());
        Self {
            status: StatusCode::NOT_FOUND,
            message,
            errors: None,
            report,
        }
    }

    /// Generic 500; the detail goes to the log, never to the caller.
    pub fn internal(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            detail,
        )
    }

    pub fn from_content(source: &'static str, error: ContentError) -> Self {
        match error {
            ContentError::Validation(errors) => Self::validation(source, errors),
            ContentError::NotFound => Self::not_found(source, "Not found"),
            ContentError::Repo(err) => Self::internal(source, err.to_string()),
        }
    }

    /// Structured 429 with a `Retry-After` header.
    pub fn rate_limited(retry_after: u64) -> Response {
        let body = ErrorBody {
            success: false,
            message: "Too many requests from this IP, please try again later.".to_string(),
            errors: None,
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            "infra::http::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            format!("rate_limited: retry_after={retry_after}"),
        )
        .attach(&mut response);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            errors: self.errors,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
