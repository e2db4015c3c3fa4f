//! Shared wire types for the Alexandria Petroleum content API.
//!
//! Everything the HTTP surface serializes lives here so the server, its
//! integration tests, and external consumers agree on one set of shapes.
//! Field names follow the JSON observed by the site frontend (camelCase).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Orientation hint for news imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrientation {
    Vertical,
    Horizontal,
}

impl ImageOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

impl FromStr for ImageOrientation {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "vertical" => Ok(Self::Vertical),
            "horizontal" => Ok(Self::Horizontal),
            other => Err(UnknownVariant {
                field: "imageOrientation",
                value: other.to_string(),
            }),
        }
    }
}

/// Project grouping used by the portfolio page filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    MajorProjects,
    ReplacementRenovation,
    GeographicalRegion,
}

impl ProjectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MajorProjects => "major_projects",
            Self::ReplacementRenovation => "replacement_renovation",
            Self::GeographicalRegion => "geographical_region",
        }
    }
}

impl FromStr for ProjectCategory {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "major_projects" => Ok(Self::MajorProjects),
            "replacement_renovation" => Ok(Self::ReplacementRenovation),
            "geographical_region" => Ok(Self::GeographicalRegion),
            other => Err(UnknownVariant {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Parse failure for a closed string enumeration.
#[derive(Debug, Clone)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a valid {}", self.value, self.field)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharingRate {
    pub id: i64,
    pub title: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chairman {
    pub id: i64,
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

/// One block of structured news body copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NewsBlock {
    Paragraph { text: String },
    List { items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsImage {
    pub image_url: String,
}

/// Row shape for the news listing; the first stored image doubles as cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSummary {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Full news item with joined images, as served by `GET /api/news/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_orientation: ImageOrientation,
    pub description: Vec<NewsBlock>,
    pub images: Vec<NewsImage>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerMessage {
    pub id: i64,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectImage {
    pub image_url: String,
    pub is_cover: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub key: String,
    pub value: String,
}

/// Row shape for the portfolio listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Full project with joined images and detail rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub category: ProjectCategory,
    pub description: Value,
    pub images: Vec<ProjectImage>,
    pub details: Vec<ProjectDetail>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_replied: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    pub total: i64,
    pub unreplied: i64,
    pub today: i64,
}

/// Receipt returned after a successful contact submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmitReceipt {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

// ============================================================================
// Change events
// ============================================================================

/// Entity families that fan change notifications out to open browser tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    SharingRates,
    Chairmen,
    News,
    Projects,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SharingRates => "sharing_rates",
            Self::Chairmen => "chairmen",
            Self::News => "news",
            Self::Projects => "projects",
        }
    }

    /// SSE event name the frontend subscribes to.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SharingRates => "sharing_rates:update",
            Self::Chairmen => "chairmen:update",
            Self::News => "news:update",
            Self::Projects => "projects:update",
        }
    }
}

/// Body of one change event as written to the SSE stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangePayload {
    Created { item: Value },
    Updated { item: Value },
    Deleted { id: i64 },
}

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error body shared by every endpoint family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Success wrapper used by the contact admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}
