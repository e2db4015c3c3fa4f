//! Chairman CRUD: portrait handling plus the single-featured invariant.

use std::sync::Arc;

use alexpetro_api_types::{ChangeKind, ChangePayload, Chairman};

use crate::application::repos::{ChairmenRepo, CreateChairmanParams, UpdateChairmanParams};
use crate::application::stream::ChangeHub;
use crate::infra::uploads::UploadStorage;

use super::validate::{TITLE_MAX, image_url, optional_text, require_text};
use super::{ContentError, UploadedFile, collect, created_payload, updated_payload};

/// What the caller said about the portrait, as parsed from the multipart
/// form. `Unchanged` means the field was absent entirely; an empty
/// `imageUrl` maps to `Remove`.
#[derive(Debug, Clone)]
pub enum PortraitSource {
    Unchanged,
    Remove,
    Url(String),
    File(UploadedFile),
}

#[derive(Debug, Clone)]
pub struct ChairmanInput {
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
    pub portrait: PortraitSource,
}

#[derive(Clone)]
pub struct ChairmenService {
    repo: Arc<dyn ChairmenRepo>,
    hub: Arc<ChangeHub>,
    storage: Arc<UploadStorage>,
}

impl ChairmenService {
    pub fn new(
        repo: Arc<dyn ChairmenRepo>,
        hub: Arc<ChangeHub>,
        storage: Arc<UploadStorage>,
    ) -> Self {
        Self { repo, hub, storage }
    }

    pub async fn list(&self) -> Result<Vec<Chairman>, ContentError> {
        let chairmen = self
            .repo
            .list_chairmen()
            .await
            .map_err(ContentError::from_repo)?;
        Ok(chairmen.into_iter().map(Chairman::from).collect())
    }

    pub async fn create(&self, input: ChairmanInput) -> Result<Chairman, ContentError> {
        let fields = validated(&input)?;

        let (image_url, stored_path) = match &input.portrait {
            PortraitSource::File(file) => {
                let stored = self
                    .storage
                    .store(&file.filename, file.bytes.clone())
                    .await
                    .map_err(|err| ContentError::single("imageFile", err.to_string()))?;
                (Some(stored.public_url()), Some(stored.stored_path))
            }
            PortraitSource::Url(url) => (
                Some(image_url_checked(url)?),
                None,
            ),
            PortraitSource::Unchanged | PortraitSource::Remove => (None, None),
        };

        let result = self
            .repo
            .create_chairman(CreateChairmanParams {
                name: fields.name,
                subtitle: fields.subtitle,
                description: fields.description,
                image_url,
                is_featured: input.is_featured,
            })
            .await;

        let record = match result {
            Ok(record) => record,
            Err(err) => {
                // Don't leave an orphan file behind a failed insert.
                if let Some(path) = stored_path {
                    let _ = self.storage.delete(&path).await;
                }
                return Err(ContentError::from_repo(err));
            }
        };

        let chairman = Chairman::from(record);
        if let Some(payload) = created_payload(&chairman) {
            self.hub.broadcast(ChangeKind::Chairmen, payload);
        }
        Ok(chairman)
    }

    pub async fn update(&self, id: i64, input: ChairmanInput) -> Result<Chairman, ContentError> {
        let fields = validated(&input)?;

        let existing = self
            .repo
            .find_chairman(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;

        let (image_url, stored_path, replaced_url) = match &input.portrait {
            PortraitSource::File(file) => {
                let stored = self
                    .storage
                    .store(&file.filename, file.bytes.clone())
                    .await
                    .map_err(|err| ContentError::single("imageFile", err.to_string()))?;
                (
                    Some(stored.public_url()),
                    Some(stored.stored_path),
                    existing.image_url.clone(),
                )
            }
            PortraitSource::Url(url) => (
                Some(image_url_checked(url)?),
                None,
                existing.image_url.clone(),
            ),
            PortraitSource::Remove => (None, None, existing.image_url.clone()),
            PortraitSource::Unchanged => (existing.image_url.clone(), None, None),
        };

        let result = self
            .repo
            .update_chairman(UpdateChairmanParams {
                id,
                name: fields.name,
                subtitle: fields.subtitle,
                description: fields.description,
                image_url,
                is_featured: input.is_featured,
            })
            .await;

        let record = match result {
            Ok(record) => record,
            Err(err) => {
                if let Some(path) = stored_path {
                    let _ = self.storage.delete(&path).await;
                }
                return Err(ContentError::from_repo(err));
            }
        };

        // Release the previous portrait only after the row change landed.
        if let Some(old_url) = replaced_url {
            self.storage.release_public_url(&old_url).await;
        }

        let chairman = Chairman::from(record);
        if let Some(payload) = updated_payload(&chairman) {
            self.hub.broadcast(ChangeKind::Chairmen, payload);
        }
        Ok(chairman)
    }

    /// Idempotent delete; the removal event fires either way.
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        let existing = self
            .repo
            .find_chairman(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.repo
            .delete_chairman(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.hub
            .broadcast(ChangeKind::Chairmen, ChangePayload::Deleted { id });

        if let Some(url) = existing.and_then(|record| record.image_url) {
            self.storage.release_public_url(&url).await;
        }
        Ok(())
    }
}

struct ValidatedFields {
    name: String,
    subtitle: Option<String>,
    description: Option<String>,
}

fn validated(input: &ChairmanInput) -> Result<ValidatedFields, ContentError> {
    let mut errors = Vec::new();
    let name = collect(&mut errors, require_text("name", &input.name, TITLE_MAX));
    let subtitle = collect(
        &mut errors,
        optional_text("subtitle", input.subtitle.clone(), TITLE_MAX),
    );

    match (name, subtitle) {
        (Some(name), Some(subtitle)) if errors.is_empty() => Ok(ValidatedFields {
            name,
            subtitle,
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }),
        _ => Err(ContentError::validation(errors)),
    }
}

fn image_url_checked(url: &str) -> Result<String, ContentError> {
    image_url("imageUrl", url).map_err(|err| ContentError::validation(vec![err]))
}
