//! In-memory repository fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use alexpetro::application::cache::ContentCache;
use alexpetro::application::content::chairmen::ChairmenService;
use alexpetro::application::content::contacts::ContactsService;
use alexpetro::application::content::news::NewsService;
use alexpetro::application::content::projects::ProjectsService;
use alexpetro::application::content::rates::RatesService;
use alexpetro::application::content::ticker::TickerService;
use alexpetro::application::mail::MailNotifier;
use alexpetro::application::repos::{
    ChairmenRepo, ContactQueryFilter, ContactsRepo, CreateChairmanParams, CreateContactParams,
    CreateNewsParams, CreateProjectParams, CreateRateParams, NewsRepo, ProjectsRepo, RatesRepo,
    RepoError, TickerRepo, UpdateChairmanParams, UpdateNewsParams, UpdateProjectParams,
    UpdateRateParams,
};
use alexpetro::application::stream::ChangeHub;
use alexpetro::domain::entities::{
    ChairmanRecord, ContactRecord, NewsComposite, NewsImageRecord, NewsItemRecord,
    NewsSummaryRecord, ProjectComposite, ProjectDetailRecord, ProjectImageRecord, ProjectRecord,
    ProjectSummaryRecord, SharingRateRecord, TickerRecord,
};
use alexpetro::infra::http::ApiState;
use alexpetro::infra::rate_limit::SubmitRateLimiter;
use alexpetro::infra::recaptcha::RecaptchaVerifier;
use alexpetro::infra::uploads::UploadStorage;

use alexpetro_api_types::{ContactStats, ProjectCategory};

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// ============================================================================
// Sharing rates
// ============================================================================

#[derive(Default)]
pub struct InMemoryRates {
    pub rows: Mutex<Vec<SharingRateRecord>>,
    next_id: AtomicI64,
}

impl InMemoryRates {
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RatesRepo for InMemoryRates {
    async fn list_rates(&self) -> Result<Vec<SharingRateRecord>, RepoError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|row| std::cmp::Reverse(row.id));
        Ok(rows)
    }

    async fn create_rate(&self, params: CreateRateParams) -> Result<SharingRateRecord, RepoError> {
        let record = SharingRateRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            title: params.title,
            percentage: params.percentage,
            created_at: now(),
            updated_at: now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_rate(&self, params: UpdateRateParams) -> Result<SharingRateRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == params.id)
            .ok_or(RepoError::NotFound)?;
        row.title = params.title;
        row.percentage = params.percentage;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn delete_rate(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }
}

// ============================================================================
// Chairmen
// ============================================================================

#[derive(Default)]
pub struct InMemoryChairmen {
    pub rows: Mutex<Vec<ChairmanRecord>>,
    next_id: AtomicI64,
}

impl InMemoryChairmen {
    pub fn featured_ids(&self) -> Vec<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.is_featured)
            .map(|row| row.id)
            .collect()
    }
}

#[async_trait]
impl ChairmenRepo for InMemoryChairmen {
    async fn list_chairmen(&self) -> Result<Vec<ChairmanRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_chairman(&self, id: i64) -> Result<Option<ChairmanRecord>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn create_chairman(
        &self,
        params: CreateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if params.is_featured {
            for row in rows.iter_mut() {
                row.is_featured = false;
            }
        }
        let record = ChairmanRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: params.name,
            subtitle: params.subtitle,
            description: params.description,
            image_url: params.image_url,
            is_featured: params.is_featured,
            created_at: now(),
            updated_at: now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn update_chairman(
        &self,
        params: UpdateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if params.is_featured {
            for row in rows.iter_mut() {
                if row.id != params.id {
                    row.is_featured = false;
                }
            }
        }
        let row = rows
            .iter_mut()
            .find(|row| row.id == params.id)
            .ok_or(RepoError::NotFound)?;
        row.name = params.name;
        row.subtitle = params.subtitle;
        row.description = params.description;
        row.image_url = params.image_url;
        row.is_featured = params.is_featured;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn delete_chairman(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }
}

// ============================================================================
// News
// ============================================================================

#[derive(Default)]
pub struct InMemoryNews {
    pub rows: Mutex<Vec<NewsComposite>>,
    next_id: AtomicI64,
}

impl InMemoryNews {
    pub fn stored_urls(&self, id: i64) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|composite| composite.item.id == id)
            .map(|composite| composite.image_urls())
            .unwrap_or_default()
    }

    pub fn stored_title(&self, id: i64) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|composite| composite.item.id == id)
            .map(|composite| composite.item.title.clone())
    }
}

#[async_trait]
impl NewsRepo for InMemoryNews {
    async fn list_news(&self) -> Result<Vec<NewsSummaryRecord>, RepoError> {
        let rows = self.rows.lock().unwrap();
        let mut summaries: Vec<NewsSummaryRecord> = rows
            .iter()
            .map(|composite| NewsSummaryRecord {
                id: composite.item.id,
                title: composite.item.title.clone(),
                subtitle: composite.item.subtitle.clone(),
                image_orientation: composite.item.image_orientation,
                cover_image: composite
                    .images
                    .first()
                    .map(|image| image.image_url.clone()),
                created_at: composite.item.created_at,
            })
            .collect();
        summaries.sort_by_key(|summary| std::cmp::Reverse(summary.id));
        Ok(summaries)
    }

    async fn find_news(&self, id: i64) -> Result<Option<NewsComposite>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|composite| composite.item.id == id)
            .cloned())
    }

    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsComposite, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let images = params
            .image_urls
            .iter()
            .enumerate()
            .map(|(position, url)| NewsImageRecord {
                id: id * 1000 + position as i64,
                news_id: id,
                image_url: url.clone(),
                position: position as i32,
            })
            .collect();
        let composite = NewsComposite {
            item: NewsItemRecord {
                id,
                title: params.title,
                subtitle: params.subtitle,
                image_orientation: params.image_orientation,
                description: params.description,
                created_at: now(),
                updated_at: now(),
            },
            images,
        };
        self.rows.lock().unwrap().push(composite.clone());
        Ok(composite)
    }

    async fn update_news(&self, params: UpdateNewsParams) -> Result<NewsComposite, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let composite = rows
            .iter_mut()
            .find(|composite| composite.item.id == params.id)
            .ok_or(RepoError::NotFound)?;

        composite.item.title = params.title;
        composite.item.subtitle = params.subtitle;
        composite.item.image_orientation = params.image_orientation;
        composite.item.description = params.description;
        composite.item.updated_at = now();

        let final_urls: Vec<String> = params
            .keep_image_urls
            .iter()
            .chain(params.insert_image_urls.iter())
            .cloned()
            .collect();
        composite.images = final_urls
            .iter()
            .enumerate()
            .map(|(position, url)| NewsImageRecord {
                id: params.id * 1000 + position as i64,
                news_id: params.id,
                image_url: url.clone(),
                position: position as i32,
            })
            .collect();

        Ok(composite.clone())
    }

    async fn delete_news(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|composite| composite.item.id != id);
        Ok(rows.len() < before)
    }
}

// ============================================================================
// Ticker
// ============================================================================

#[derive(Default)]
pub struct InMemoryTicker {
    pub rows: Mutex<Vec<TickerRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl TickerRepo for InMemoryTicker {
    async fn list_messages(&self) -> Result<Vec<TickerRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create_message(&self, message: String) -> Result<TickerRecord, RepoError> {
        let record = TickerRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            message,
            created_at: now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_message(&self, id: i64, message: String) -> Result<TickerRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.message = message;
        Ok(row.clone())
    }

    async fn delete_message(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Default)]
pub struct InMemoryProjects {
    pub rows: Mutex<Vec<ProjectComposite>>,
    next_id: AtomicI64,
}

impl InMemoryProjects {
    pub fn stored_urls(&self, id: i64) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|composite| composite.project.id == id)
            .map(|composite| composite.image_urls())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProjectsRepo for InMemoryProjects {
    async fn list_projects(
        &self,
        category: Option<ProjectCategory>,
    ) -> Result<Vec<ProjectSummaryRecord>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|composite| {
                category.is_none_or(|filter| composite.project.category == filter)
            })
            .map(|composite| ProjectSummaryRecord {
                id: composite.project.id,
                title: composite.project.title.clone(),
                category: composite.project.category,
                description: composite.project.description.clone(),
                cover_image: composite
                    .images
                    .first()
                    .map(|image| image.image_url.clone()),
                created_at: composite.project.created_at,
            })
            .collect())
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectComposite>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|composite| composite.project.id == id)
            .cloned())
    }

    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectComposite, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let composite = ProjectComposite {
            project: ProjectRecord {
                id,
                title: params.title,
                category: params.category,
                description: params.description,
                created_at: now(),
                updated_at: now(),
            },
            images: params
                .image_urls
                .iter()
                .enumerate()
                .map(|(position, url)| ProjectImageRecord {
                    id: id * 1000 + position as i64,
                    project_id: id,
                    image_url: url.clone(),
                    position: position as i32,
                })
                .collect(),
            details: params
                .details
                .iter()
                .enumerate()
                .map(|(position, (key, value))| ProjectDetailRecord {
                    id: id * 1000 + position as i64,
                    project_id: id,
                    detail_key: key.clone(),
                    detail_value: value.clone(),
                    position: position as i32,
                })
                .collect(),
        };
        self.rows.lock().unwrap().push(composite.clone());
        Ok(composite)
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectComposite, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let composite = rows
            .iter_mut()
            .find(|composite| composite.project.id == params.id)
            .ok_or(RepoError::NotFound)?;

        composite.project.title = params.title;
        composite.project.category = params.category;
        composite.project.description = params.description;
        composite.project.updated_at = now();

        let final_urls: Vec<String> = params
            .keep_image_urls
            .iter()
            .chain(params.insert_image_urls.iter())
            .cloned()
            .collect();
        composite.images = final_urls
            .iter()
            .enumerate()
            .map(|(position, url)| ProjectImageRecord {
                id: params.id * 1000 + position as i64,
                project_id: params.id,
                image_url: url.clone(),
                position: position as i32,
            })
            .collect();

        composite.details = params
            .details
            .iter()
            .enumerate()
            .map(|(position, (key, value))| ProjectDetailRecord {
                id: params.id * 1000 + position as i64,
                project_id: params.id,
                detail_key: key.clone(),
                detail_value: value.clone(),
                position: position as i32,
            })
            .collect();

        Ok(composite.clone())
    }

    async fn delete_project(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|composite| composite.project.id != id);
        Ok(rows.len() < before)
    }
}

// ============================================================================
// Contacts
// ============================================================================

#[derive(Default)]
pub struct InMemoryContacts {
    pub rows: Mutex<Vec<ContactRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl ContactsRepo for InMemoryContacts {
    async fn create_contact(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        let record = ContactRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: params.name,
            email: params.email,
            subject: params.subject,
            message: params.message,
            is_replied: false,
            created_at: now(),
            updated_at: now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_contacts(
        &self,
        filter: &ContactQueryFilter,
    ) -> Result<Vec<ContactRecord>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| {
                filter.is_replied.is_none_or(|wanted| row.is_replied == wanted)
                    && filter.search.as_deref().is_none_or(|needle| {
                        row.name.contains(needle)
                            || row.email.contains(needle)
                            || row.subject.contains(needle)
                    })
            })
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.clamp(1, 100) as usize)
            .cloned()
            .collect())
    }

    async fn find_contact(&self, id: i64) -> Result<Option<ContactRecord>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn set_contact_replied(
        &self,
        id: i64,
        is_replied: bool,
    ) -> Result<ContactRecord, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.is_replied = is_replied;
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn delete_contact(&self, id: i64) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn contact_stats(&self) -> Result<ContactStats, RepoError> {
        let rows = self.rows.lock().unwrap();
        let today = now().date();
        Ok(ContactStats {
            total: rows.len() as i64,
            unreplied: rows.iter().filter(|row| !row.is_replied).count() as i64,
            today: rows
                .iter()
                .filter(|row| row.created_at.date() == today)
                .count() as i64,
        })
    }
}

// ============================================================================
// Wiring helpers
// ============================================================================

pub struct TestBackend {
    pub rates: Arc<InMemoryRates>,
    pub chairmen: Arc<InMemoryChairmen>,
    pub news: Arc<InMemoryNews>,
    pub ticker: Arc<InMemoryTicker>,
    pub projects: Arc<InMemoryProjects>,
    pub contacts: Arc<InMemoryContacts>,
    pub hub: Arc<ChangeHub>,
    pub cache: Arc<ContentCache>,
    pub storage: Arc<UploadStorage>,
}

impl TestBackend {
    pub fn new(upload_dir: &std::path::Path) -> Self {
        Self::with_cache_ttl(upload_dir, Duration::from_secs(60))
    }

    pub fn with_cache_ttl(upload_dir: &std::path::Path, ttl: Duration) -> Self {
        Self {
            rates: Arc::new(InMemoryRates::default()),
            chairmen: Arc::new(InMemoryChairmen::default()),
            news: Arc::new(InMemoryNews::default()),
            ticker: Arc::new(InMemoryTicker::default()),
            projects: Arc::new(InMemoryProjects::default()),
            contacts: Arc::new(InMemoryContacts::default()),
            hub: Arc::new(ChangeHub::new()),
            cache: Arc::new(ContentCache::new(ttl)),
            storage: Arc::new(
                UploadStorage::new(upload_dir.to_path_buf()).expect("upload storage"),
            ),
        }
    }

    pub fn rates_service(&self) -> RatesService {
        RatesService::new(self.rates.clone(), self.hub.clone())
    }

    pub fn chairmen_service(&self) -> ChairmenService {
        ChairmenService::new(self.chairmen.clone(), self.hub.clone(), self.storage.clone())
    }

    pub fn news_service(&self) -> NewsService {
        NewsService::new(
            self.news.clone(),
            self.hub.clone(),
            self.cache.clone(),
            self.storage.clone(),
        )
    }

    pub fn projects_service(&self) -> ProjectsService {
        ProjectsService::new(
            self.projects.clone(),
            self.hub.clone(),
            self.cache.clone(),
            self.storage.clone(),
        )
    }

    pub fn api_state(&self, submit_limit: u32) -> ApiState {
        ApiState {
            rates: Arc::new(self.rates_service()),
            chairmen: Arc::new(self.chairmen_service()),
            news: Arc::new(self.news_service()),
            ticker: Arc::new(TickerService::new(self.ticker.clone())),
            projects: Arc::new(self.projects_service()),
            contacts: Arc::new(ContactsService::new(
                self.contacts.clone(),
                MailNotifier::disabled(),
            )),
            hub: self.hub.clone(),
            cache: self.cache.clone(),
            storage: self.storage.clone(),
            submit_limiter: Arc::new(SubmitRateLimiter::new(
                Duration::from_secs(60),
                submit_limit,
            )),
            recaptcha: Arc::new(RecaptchaVerifier::new(
                &alexpetro::config::RecaptchaSettings {
                    secret_key: None,
                    verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
                },
            )),
        }
    }
}
