//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use alexpetro_api_types::{ContactStats, ImageOrientation, NewsBlock, ProjectCategory};

use crate::domain::entities::{
    ChairmanRecord, ContactRecord, NewsComposite, NewsSummaryRecord, ProjectComposite,
    ProjectSummaryRecord, SharingRateRecord, TickerRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateRateParams {
    pub title: String,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct UpdateRateParams {
    pub id: i64,
    pub title: String,
    pub percentage: f64,
}

#[async_trait]
pub trait RatesRepo: Send + Sync {
    async fn list_rates(&self) -> Result<Vec<SharingRateRecord>, RepoError>;

    async fn create_rate(&self, params: CreateRateParams) -> Result<SharingRateRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] for an unknown id.
    async fn update_rate(&self, params: UpdateRateParams) -> Result<SharingRateRecord, RepoError>;

    /// Returns `false` when the row was already gone.
    async fn delete_rate(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateChairmanParams {
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateChairmanParams {
    pub id: i64,
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

#[async_trait]
pub trait ChairmenRepo: Send + Sync {
    async fn list_chairmen(&self) -> Result<Vec<ChairmanRecord>, RepoError>;

    async fn find_chairman(&self, id: i64) -> Result<Option<ChairmanRecord>, RepoError>;

    /// When `is_featured` is set, every other chairman loses the flag in the
    /// same transaction.
    async fn create_chairman(
        &self,
        params: CreateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError>;

    async fn update_chairman(
        &self,
        params: UpdateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError>;

    async fn delete_chairman(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateNewsParams {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub description: Vec<NewsBlock>,
    pub image_urls: Vec<String>,
}

/// Update parameters carrying a pre-computed child reconciliation plan.
///
/// `keep_image_urls` lists surviving rows in their final relative order;
/// `remove_image_urls` are deleted; `insert_image_urls` are appended after
/// the survivors.
#[derive(Debug, Clone)]
pub struct UpdateNewsParams {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub description: Vec<NewsBlock>,
    pub keep_image_urls: Vec<String>,
    pub remove_image_urls: Vec<String>,
    pub insert_image_urls: Vec<String>,
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    async fn list_news(&self) -> Result<Vec<NewsSummaryRecord>, RepoError>;

    async fn find_news(&self, id: i64) -> Result<Option<NewsComposite>, RepoError>;

    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsComposite, RepoError>;

    async fn update_news(&self, params: UpdateNewsParams) -> Result<NewsComposite, RepoError>;

    async fn delete_news(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait TickerRepo: Send + Sync {
    async fn list_messages(&self) -> Result<Vec<TickerRecord>, RepoError>;

    async fn create_message(&self, message: String) -> Result<TickerRecord, RepoError>;

    async fn update_message(&self, id: i64, message: String) -> Result<TickerRecord, RepoError>;

    async fn delete_message(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateProjectParams {
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub image_urls: Vec<String>,
    pub details: Vec<(String, String)>,
}

/// Image handling mirrors [`UpdateNewsParams`]; detail rows are replaced
/// wholesale with the supplied set.
#[derive(Debug, Clone)]
pub struct UpdateProjectParams {
    pub id: i64,
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub keep_image_urls: Vec<String>,
    pub remove_image_urls: Vec<String>,
    pub insert_image_urls: Vec<String>,
    pub details: Vec<(String, String)>,
}

#[async_trait]
pub trait ProjectsRepo: Send + Sync {
    async fn list_projects(
        &self,
        category: Option<ProjectCategory>,
    ) -> Result<Vec<ProjectSummaryRecord>, RepoError>;

    async fn find_project(&self, id: i64) -> Result<Option<ProjectComposite>, RepoError>;

    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectComposite, RepoError>;

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectComposite, RepoError>;

    async fn delete_project(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateContactParams {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContactQueryFilter {
    pub search: Option<String>,
    pub is_replied: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ContactsRepo: Send + Sync {
    async fn create_contact(&self, params: CreateContactParams)
    -> Result<ContactRecord, RepoError>;

    async fn list_contacts(
        &self,
        filter: &ContactQueryFilter,
    ) -> Result<Vec<ContactRecord>, RepoError>;

    async fn find_contact(&self, id: i64) -> Result<Option<ContactRecord>, RepoError>;

    /// Fails with [`RepoError::NotFound`] for an unknown id.
    async fn set_contact_replied(
        &self,
        id: i64,
        is_replied: bool,
    ) -> Result<ContactRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] for an unknown id; contact deletes
    /// are not idempotent, matching the admin UI's expectations.
    async fn delete_contact(&self, id: i64) -> Result<(), RepoError>;

    async fn contact_stats(&self) -> Result<ContactStats, RepoError>;
}
