//! Sharing-rate CRUD with change broadcasting.

use std::sync::Arc;

use alexpetro_api_types::{ChangeKind, ChangePayload, SharingRate};

use crate::application::repos::{CreateRateParams, RatesRepo, UpdateRateParams};
use crate::application::stream::ChangeHub;

use super::validate::{TITLE_MAX, percentage, require_text};
use super::{ContentError, collect, created_payload, updated_payload};

#[derive(Debug, Clone)]
pub struct RateInput {
    pub title: String,
    pub percentage: f64,
}

#[derive(Clone)]
pub struct RatesService {
    repo: Arc<dyn RatesRepo>,
    hub: Arc<ChangeHub>,
}

impl RatesService {
    pub fn new(repo: Arc<dyn RatesRepo>, hub: Arc<ChangeHub>) -> Self {
        Self { repo, hub }
    }

    pub async fn list(&self) -> Result<Vec<SharingRate>, ContentError> {
        let rates = self
            .repo
            .list_rates()
            .await
            .map_err(ContentError::from_repo)?;
        Ok(rates.into_iter().map(SharingRate::from).collect())
    }

    pub async fn create(&self, input: RateInput) -> Result<SharingRate, ContentError> {
        let (title, value) = validated(&input)?;

        let record = self
            .repo
            .create_rate(CreateRateParams {
                title,
                percentage: value,
            })
            .await
            .map_err(ContentError::from_repo)?;

        let rate = SharingRate::from(record);
        if let Some(payload) = created_payload(&rate) {
            self.hub.broadcast(ChangeKind::SharingRates, payload);
        }
        Ok(rate)
    }

    pub async fn update(&self, id: i64, input: RateInput) -> Result<SharingRate, ContentError> {
        let (title, value) = validated(&input)?;

        let record = self
            .repo
            .update_rate(UpdateRateParams {
                id,
                title,
                percentage: value,
            })
            .await
            .map_err(ContentError::from_repo)?;

        let rate = SharingRate::from(record);
        if let Some(payload) = updated_payload(&rate) {
            self.hub.broadcast(ChangeKind::SharingRates, payload);
        }
        Ok(rate)
    }

    /// Idempotent: a second delete of the same id succeeds and re-announces
    /// the removal.
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        self.repo
            .delete_rate(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.hub
            .broadcast(ChangeKind::SharingRates, ChangePayload::Deleted { id });
        Ok(())
    }
}

fn validated(input: &RateInput) -> Result<(String, f64), ContentError> {
    let mut errors = Vec::new();
    let title = collect(&mut errors, require_text("title", &input.title, TITLE_MAX));
    let value = collect(&mut errors, percentage(input.percentage));

    match (title, value) {
        (Some(title), Some(value)) if errors.is_empty() => Ok((title, value)),
        _ => Err(ContentError::validation(errors)),
    }
}
