//! Persistence-facing records and their conversions to wire shapes.

use alexpetro_api_types::{
    Chairman, ContactMessage, ImageOrientation, NewsBlock, NewsImage, NewsItem, NewsSummary,
    Project, ProjectCategory, ProjectDetail, ProjectImage, ProjectSummary, SharingRate,
    TickerMessage,
};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct SharingRateRecord {
    pub id: i64,
    pub title: String,
    pub percentage: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<SharingRateRecord> for SharingRate {
    fn from(record: SharingRateRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            percentage: record.percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChairmanRecord {
    pub id: i64,
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ChairmanRecord> for Chairman {
    fn from(record: ChairmanRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            subtitle: record.subtitle,
            description: record.description,
            image_url: record.image_url,
            is_featured: record.is_featured,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItemRecord {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub description: Vec<NewsBlock>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsImageRecord {
    pub id: i64,
    pub news_id: i64,
    pub image_url: String,
    pub position: i32,
}

/// A news item together with its ordered image rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsComposite {
    pub item: NewsItemRecord,
    pub images: Vec<NewsImageRecord>,
}

impl NewsComposite {
    pub fn into_api(self) -> NewsItem {
        NewsItem {
            id: self.item.id,
            title: self.item.title,
            subtitle: self.item.subtitle,
            image_orientation: self.item.image_orientation,
            description: self.item.description,
            images: self
                .images
                .into_iter()
                .map(|image| NewsImage {
                    image_url: image.image_url,
                })
                .collect(),
            created_at: self.item.created_at,
        }
    }

    /// Stored URLs in display order, used by update reconciliation.
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|image| image.image_url.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsSummaryRecord {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub cover_image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<NewsSummaryRecord> for NewsSummary {
    fn from(record: NewsSummaryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            subtitle: record.subtitle,
            image_orientation: record.image_orientation,
            cover_image: record.cover_image,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerRecord {
    pub id: i64,
    pub message: String,
    pub created_at: OffsetDateTime,
}

impl From<TickerRecord> for TickerMessage {
    fn from(record: TickerRecord) -> Self {
        Self {
            id: record.id,
            message: record.message,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: i64,
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectImageRecord {
    pub id: i64,
    pub project_id: i64,
    pub image_url: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetailRecord {
    pub id: i64,
    pub project_id: i64,
    pub detail_key: String,
    pub detail_value: String,
    pub position: i32,
}

/// A project together with its ordered image and detail rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectComposite {
    pub project: ProjectRecord,
    pub images: Vec<ProjectImageRecord>,
    pub details: Vec<ProjectDetailRecord>,
}

impl ProjectComposite {
    pub fn into_api(self) -> Project {
        Project {
            id: self.project.id,
            title: self.project.title,
            category: self.project.category,
            description: self.project.description,
            images: self
                .images
                .into_iter()
                .map(|image| ProjectImage {
                    is_cover: image.position == 0,
                    image_url: image.image_url,
                })
                .collect(),
            details: self
                .details
                .into_iter()
                .map(|detail| ProjectDetail {
                    key: detail.detail_key,
                    value: detail.detail_value,
                })
                .collect(),
            created_at: self.project.created_at,
        }
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|image| image.image_url.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummaryRecord {
    pub id: i64,
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub cover_image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<ProjectSummaryRecord> for ProjectSummary {
    fn from(record: ProjectSummaryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            category: record.category,
            description: record.description,
            cover_image: record.cover_image,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_replied: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ContactRecord> for ContactMessage {
    fn from(record: ContactRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            subject: record.subject,
            message: record.message,
            is_replied: record.is_replied,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
