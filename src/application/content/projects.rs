//! Project CRUD: cached composite reads, gallery reconciliation, and
//! delete-all-reinsert detail rows.

use std::str::FromStr;
use std::sync::Arc;

use alexpetro_api_types::{ChangeKind, ChangePayload, Project, ProjectCategory, ProjectSummary};
use serde_json::Value;
use tracing::warn;

use crate::application::cache::{ContentCache, project_key};
use crate::application::reconcile::plan_children;
use crate::application::repos::{CreateProjectParams, ProjectsRepo, UpdateProjectParams};
use crate::application::stream::ChangeHub;
use crate::infra::uploads::UploadStorage;

use super::validate::{
    TITLE_MAX, image_url, keep_set, project_description, project_details, require_text,
};
use super::{ContentError, UploadedFile, collect, created_payload, item_value, updated_payload};

/// Raw multipart form content; the service is the single validation boundary.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub category: Option<String>,
    pub description_json: Option<String>,
    pub details_json: Option<String>,
    pub uploads: Vec<UploadedFile>,
    pub image_urls: Vec<String>,
    pub keep_json: Option<String>,
}

#[derive(Clone)]
pub struct ProjectsService {
    repo: Arc<dyn ProjectsRepo>,
    hub: Arc<ChangeHub>,
    cache: Arc<ContentCache>,
    storage: Arc<UploadStorage>,
}

impl ProjectsService {
    pub fn new(
        repo: Arc<dyn ProjectsRepo>,
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

    pub async fn list(
        &self,
        category: Option<String>,
    ) -> Result<Vec<ProjectSummary>, ContentError> {
        let filter = match category.as_deref() {
            None => None,
            Some(raw) => Some(
                ProjectCategory::from_str(raw.trim())
                    .map_err(|unknown| ContentError::single("category", unknown.to_string()))?,
            ),
        };

        let summaries = self
            .repo
            .list_projects(filter)
            .await
            .map_err(ContentError::from_repo)?;
        Ok(summaries.into_iter().map(ProjectSummary::from).collect())
    }

    /// Composite read through the cache; a miss repopulates before returning.
    pub async fn get(&self, id: i64) -> Result<Project, ContentError> {
        let key = project_key(id);
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value::<Project>(value) {
                Ok(project) => return Ok(project),
                Err(err) => {
                    warn!(
                        target = "alexpetro::content",
                        key = %key,
                        error = %err,
                        "cached project snapshot had an unexpected shape, refetching"
                    );
                    self.cache.delete(&key);
                }
            }
        }

        let composite = self
            .repo
            .find_project(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;

        let project = composite.into_api();
        if let Some(value) = item_value(&project) {
            self.cache.set(key, value);
        }
        Ok(project)
    }

    pub async fn create(&self, draft: ProjectDraft) -> Result<Project, ContentError> {
        let fields = validated(&draft)?;

        let (uploaded_urls, stored_paths) = self.store_uploads(&draft.uploads).await?;
        let mut image_urls = uploaded_urls;
        image_urls.extend(fields.remote_urls.clone());

        let result = self
            .repo
            .create_project(CreateProjectParams {
                title: fields.title,
                category: fields.category,
                description: fields.description,
                image_urls,
                details: fields.details,
            })
            .await;

        let composite = match result {
            Ok(composite) => composite,
            Err(err) => {
                self.discard_stored(&stored_paths).await;
                return Err(ContentError::from_repo(err));
            }
        };

        let project = composite.into_api();
        if let Some(value) = item_value(&project) {
            self.cache.set(project_key(project.id), value);
        }
        if let Some(payload) = created_payload(&project) {
            self.hub.broadcast(ChangeKind::Projects, payload);
        }
        Ok(project)
    }

    pub async fn update(&self, id: i64, draft: ProjectDraft) -> Result<Project, ContentError> {
        let fields = validated(&draft)?;
        let keep = match draft.keep_json.as_deref() {
            Some(raw) => keep_set(raw).map_err(|err| ContentError::validation(vec![err]))?,
            None => Vec::new(),
        };

        let existing = self
            .repo
            .find_project(id)
            .await
            .map_err(ContentError::from_repo)?
            .ok_or(ContentError::NotFound)?;

        let (uploaded_urls, stored_paths) = self.store_uploads(&draft.uploads).await?;
        let mut incoming = uploaded_urls;
        incoming.extend(fields.remote_urls.clone());

        let plan = plan_children(&existing.image_urls(), &keep, &incoming);

        let result = self
            .repo
            .update_project(UpdateProjectParams {
                id,
                title: fields.title,
                category: fields.category,
                description: fields.description,
                keep_image_urls: plan.keep.clone(),
                remove_image_urls: plan.remove.clone(),
                insert_image_urls: plan.insert.clone(),
                details: fields.details,
            })
            .await;

        let composite = match result {
            Ok(composite) => composite,
            Err(err) => {
                self.discard_stored(&stored_paths).await;
                return Err(ContentError::from_repo(err));
            }
        };

        for url in &plan.remove {
            self.storage.release_public_url(url).await;
        }

        let project = composite.into_api();
        if let Some(value) = item_value(&project) {
            self.cache.set(project_key(project.id), value);
        }
        if let Some(payload) = updated_payload(&project) {
            self.hub.broadcast(ChangeKind::Projects, payload);
        }
        Ok(project)
    }

    /// Idempotent delete: write, drop the cache key, announce, then release
    /// the gallery files.
    pub async fn delete(&self, id: i64) -> Result<(), ContentError> {
        let existing = self
            .repo
            .find_project(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.repo
            .delete_project(id)
            .await
            .map_err(ContentError::from_repo)?;

        self.cache.delete(&project_key(id));
        self.hub
            .broadcast(ChangeKind::Projects, ChangePayload::Deleted { id });

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

struct ValidatedProject {
    title: String,
    category: ProjectCategory,
    description: Value,
    details: Vec<(String, String)>,
    remote_urls: Vec<String>,
}

fn validated(draft: &ProjectDraft) -> Result<ValidatedProject, ContentError> {
    let mut errors = Vec::new();

    let title = collect(&mut errors, require_text("title", &draft.title, TITLE_MAX));

    let category = match draft.category.as_deref() {
        None => {
            errors.push(alexpetro_api_types::FieldError {
                field: "category".to_string(),
                message: "category is required".to_string(),
            });
            None
        }
        Some(raw) => collect(
            &mut errors,
            ProjectCategory::from_str(raw.trim()).map_err(|unknown| {
                alexpetro_api_types::FieldError {
                    field: "category".to_string(),
                    message: unknown.to_string(),
                }
            }),
        ),
    };

    let description = match draft.description_json.as_deref() {
        None => Some(Value::Array(Vec::new())),
        Some(raw) => collect(&mut errors, project_description(raw)),
    };

    let details = match draft.details_json.as_deref() {
        None => Some(Vec::new()),
        Some(raw) => collect(&mut errors, project_details(raw)),
    };

    let mut remote_urls = Vec::with_capacity(draft.image_urls.len());
    for raw in &draft.image_urls {
        if let Some(url) = collect(&mut errors, image_url("imageUrls", raw)) {
            remote_urls.push(url);
        }
    }

    match (title, category, description, details) {
        (Some(title), Some(category), Some(description), Some(details))
            if errors.is_empty() =>
        {
            Ok(ValidatedProject {
                title,
                category,
                description,
                details,
                remote_urls,
            })
        }
        _ => Err(ContentError::validation(errors)),
    }
}
