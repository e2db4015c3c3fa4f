//! News CRUD: composite reads behind the snapshot cache, gallery
//! reconciliation on update.

use std::str::FromStr;
use std::sync::Arc;

use alexpetro_api_types::{ChangeKind, ChangePayload, ImageOrientation, NewsItem, NewsSummary};
use tracing::warn;

use crate::application::cache::{ContentCache, news_key};
use crate::application::reconcile::plan_children;
use crate::application::repos::{CreateNewsParams, NewsRepo, UpdateNewsParams};
use crate::application::stream::ChangeHub;
use crate::infra::uploads::UploadStorage;

use super::validate::{TITLE_MAX, image_url, keep_set, news_blocks, optional_text, require_text};
use super::{ContentError, UploadedFile, collect, created_payload, item_value, updated_payload};

/// Raw multipart form content; the service is the single validation boundary.
#[derive(Debug, Clone, Default)]
pub struct NewsDraft {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: Option<String>,
    pub description_json: Option<String>,
    pub uploads: Vec<UploadedFile>,
    pub image_urls: Vec<String>,
    /// `existingImageUrlsJson` on update; an absent field keeps nothing, which
    /// is the documented contract for an empty keep-set.
    pub keep_json: Option<String>,
}

#[derive(Clone)]
pub struct NewsService {
    repo: Arc<dyn NewsRepo>,
    hub: Arc<ChangeHub>,
    cache: Arc<ContentCache>,
    storage: Arc<UploadStorage>,
}

impl NewsService {
    pub fn new(
        repo: Arc<dyn NewsRepo>,
        hub: Arc<ChangeHub>,
        cache: Arc<ContentCache>,
        storage: Arc<UploadStorage>,
    ) -> Self {
        Self {
            repo,
            hub,
            cache,
            storage,
        }
    }

    pub async fn list(&self) -> Result<Vec<NewsSummary>, ContentError> {
        let summaries = self
            .repo
            .list_news()
            .await
            .map_err(ContentError::from_repo)?;
        Ok(summaries.into_iter().map(NewsSummary::from).collect())
    }

    /// Composite read through the cache; a miss repopulates before returning.
    pub async fn get(&self, id: i64) -> Result<NewsItem, ContentError> {
        let key = news_key(id);
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value::<NewsItem>(value) {
                Ok(item) => return Ok(item),
                Err(err) => {
                    warn!(
                        target = "alexpetro::content",
                        key = %key,
                        error = %err,
                        "cached news snapshot had an unexpected shape, refetching"
                    );
                    self.cache.delete(&key);
                }
            }
        }

        let composite = self
            .repo
            .find_news(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;

        let item = composite.into_api();
        if let Some(value) = item_value(&item) {
            self.cache.set(key, value);
        }
        Ok(item)
    }

    pub async fn create(&self, draft: NewsDraft) -> Result<NewsItem, ContentError> {
        let fields = validated(&draft)?;

        let (uploaded_urls, stored_paths) = self.store_uploads(&draft.uploads).await?;
        let mut image_urls = uploaded_urls;
        image_urls.extend(fields.remote_urls.clone());

        let result = self
            .repo
            .create_news(CreateNewsParams {
                title: fields.title,
                subtitle: fields.subtitle,
                image_orientation: fields.orientation,
                description: fields.description,
                image_urls,
            })
            .await;

        let composite = match result {
            Ok(composite) => composite,
            Err(err) => {
                self.discard_stored(&stored_paths).await;
                return Err(ContentError::from_repo(err));
            }
        };

        let item = composite.into_api();
        if let Some(value) = item_value(&item) {
            self.cache.set(news_key(item.id), value);
        }
        if let Some(payload) = created_payload(&item) {
            self.hub.broadcast(ChangeKind::News, payload);
        }
        Ok(item)
    }

    pub async fn update(&self, id: i64, draft: NewsDraft) -> Result<NewsItem, ContentError> {
        let fields = validated(&draft)?;
        let keep = match draft.keep_json.as_deref() {
            Some(raw) => keep_set(raw).map_err(|err| ContentError::validation(vec![err]))?,
            None => Vec::new(),
        };

        let existing = self
            .repo
            .find_news(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;

        let (uploaded_urls, stored_paths) = self.store_uploads(&draft.uploads).await?;
        let mut incoming = uploaded_urls;
        incoming.extend(fields.remote_urls.clone());

        let plan = plan_children(&existing.image_urls(), &keep, &incoming);

        let result = self
            .repo
            .update_news(UpdateNewsParams {
                id,
                title: fields.title,
                subtitle: fields.subtitle,
                image_orientation: fields.orientation,
                description: fields.description,
                keep_image_urls: plan.keep.clone(),
                remove_image_urls: plan.remove.clone(),
                insert_image_urls: plan.insert.clone(),
            })
            .await;

        let composite = match result {
            Ok(composite) => composite,
            Err(err) => {
                self.discard_stored(&stored_paths).await;
                return Err(ContentError::from_repo(err));
            }
        };

        // Row changes are committed; releasing the removed files is
        // best-effort from here on.
        for url in &plan.remove {
            self.storage.release_public_url(url).await;
        }

        let item = composite.into_api();
        if let Some(value) = item_value(&item) {
            self.cache.set(news_key(item.id), value);
        }
        if let Some(payload) = updated_payload(&item) {
            self.hub.broadcast(ChangeKind::News, payload);
        }
        Ok(item)
    }

    /// Idempotent delete: write, drop the cache key, announce, then release
    /// the gallery files.
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        let existing = self
            .repo
            .find_news(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.repo
            .delete_news(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.cache.delete(&news_key(id));
        self.hub
            .broadcast(ChangeKind::News, ChangePayload::Deleted { id });

        if let Some(composite) = existing {
            for url in composite.image_urls() {
                self.storage.release_public_url(&url).await;
            }
        }
        Ok(())
    }

    async fn store_uploads(
        &self,
        uploads: &[UploadedFile],
    ) -> Result<(Vec<String>, Vec<String>), ContentError> {
        let mut urls = Vec::with_capacity(uploads.len());
        let mut stored_paths = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.storage.store(&upload.filename, upload.bytes.clone()).await {
                Ok(stored) => {
                    urls.push(stored.public_url());
                    stored_paths.push(stored.stored_path);
                }
                Err(err) => {
                    self.discard_stored(&stored_paths).await;
                    return Err(ContentError::single("imageFiles", err.to_string()));
                }
            }
        }
        Ok((urls, stored_paths))
    }

    async fn discard_stored(&self, stored_paths: &[String]) {
        for path in stored_paths {
            let _ = self.storage.delete(path).await;
        }
    }
}

struct ValidatedNews {
    title: String,
    subtitle: Option<String>,
    orientation: ImageOrientation,
    description: Vec<alexpetro_api_types::NewsBlock>,
    remote_urls: Vec<String>,
}

fn validated(draft: &NewsDraft) -> Result<ValidatedNews, ContentError> {
    let mut errors = Vec::new();

    let title = collect(&mut errors, require_text("title", &draft.title, TITLE_MAX));
    let subtitle = collect(
        &mut errors,
        optional_text("subtitle", draft.subtitle.clone(), TITLE_MAX),
    );

    let orientation = match draft.image_orientation.as_deref() {
        None => Some(ImageOrientation::Horizontal),
        Some(raw) => collect(
            &mut errors,
            ImageOrientation::from_str(raw.trim()).map_err(|unknown| {
                alexpetro_api_types::FieldError {
                    field: "imageOrientation".to_string(),
                    message: unknown.to_string(),
                }
            }),
        ),
    };

    let description = match draft.description_json.as_deref() {
        None => Some(Vec::new()),
        Some(raw) => collect(&mut errors, news_blocks(raw)),
    };

    let mut remote_urls = Vec::with_capacity(draft.image_urls.len());
    for raw in &draft.image_urls {
        if let Some(url) = collect(&mut errors, image_url("imageUrls", raw)) {
            remote_urls.push(url);
        }
    }

    match (title, subtitle, orientation, description) {
        (Some(title), Some(subtitle), Some(orientation), Some(description))
            if errors.is_empty() =>
        {
            Ok(ValidatedNews {
                title,
                subtitle,
                orientation,
                description,
                remote_urls,
            })
        }
        _ => Err(ContentError::validation(errors)),
    }
}
