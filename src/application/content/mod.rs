//! Content services: one per resource family.
//!
//! Every mutating operation follows the same order: validate, write to the
//! store, refresh or drop the cache entry, broadcast the change event, return
//! the canonical representation. Cache and broadcast steps never decide the
//! HTTP outcome.

pub mod chairmen;
pub mod contacts;
pub mod news;
pub mod projects;
pub mod rates;
pub mod ticker;
pub mod validate;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use alexpetro_api_types::{ChangePayload, FieldError};

use crate::application::repos::RepoError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("resource not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl ContentError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    /// A repo-level `NotFound` is the caller's 404, not a server fault.
    pub fn from_repo(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

/// One file received through a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Accumulate one field check into the shared error list.
pub(crate) fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

/// Serialize a broadcast item; a failure here is logged and the event is
/// skipped, never surfaced to the mutation's caller.
pub(crate) fn item_value<T: Serialize>(item: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(item) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target = "alexpetro::content",
                error = %err,
                "failed to serialize change-event payload"
            );
            None
        }
    }
}

pub(crate) fn created_payload<T: Serialize>(item: &T) -> Option<ChangePayload> {
    item_value(item).map(|item| ChangePayload::Created { item })
}

pub(crate) fn updated_payload<T: Serialize>(item: &T) -> Option<ChangePayload> {
    item_value(item).map(|item| ChangePayload::Updated { item })
}
