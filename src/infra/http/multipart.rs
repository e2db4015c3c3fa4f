//! Typed multipart form parsing.
//!
//! Every accepted field is enumerated per endpoint; an unknown field fails
//! the request at this boundary instead of being coerced somewhere deeper.

use axum_extra::extract::Multipart;
use thiserror::Error;

use crate::application::content::UploadedFile;
use crate::application::content::chairmen::{ChairmanInput, PortraitSource};
use crate::application::content::news::NewsDraft;
use crate::application::content::projects::ProjectDraft;
use crate::application::content::validate::boolish;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("failed to read multipart form: {0}")]
    Read(String),
    #[error("unknown form field `{0}`")]
    UnknownField(String),
}

async fn text_field(
    field: axum_extra::extract::multipart::Field,
) -> Result<String, FormError> {
    field.text().await.map_err(|err| FormError::Read(err.to_string()))
}

async fn file_field(
    field: axum_extra::extract::multipart::Field,
) -> Result<Option<UploadedFile>, FormError> {
    let filename = field
        .file_name()
        .map(|value| value.to_string())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "upload.bin".to_string());

    let bytes = field
        .bytes()
        .await
        .map_err(|err| FormError::Read(err.to_string()))?;

    if bytes.is_empty() {
        // Browsers submit an empty part for an untouched file input.
        return Ok(None);
    }

    Ok(Some(UploadedFile { filename, bytes }))
}

/// `POST/PUT /api/chairmen`: name, subtitle, description, isFeatured, and
/// either an uploaded portrait or an imageUrl. A file wins over a URL when
/// both are present; an empty imageUrl removes the current portrait.
pub async fn read_chairman_form(multipart: &mut Multipart) -> Result<ChairmanInput, FormError> {
    let mut name = String::new();
    let mut subtitle = None;
    let mut description = None;
    let mut is_featured = false;
    let mut file: Option<UploadedFile> = None;
    let mut url_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| FormError::Read(err.to_string()))?
    {
        match field.name() {
            Some("name") => name = text_field(field).await?,
            Some("subtitle") => subtitle = Some(text_field(field).await?),
            Some("description") => description = Some(text_field(field).await?),
            Some("isFeatured") => is_featured = boolish(&text_field(field).await?),
            Some("imageUrl") => url_field = Some(text_field(field).await?),
            Some("imageFile") => {
                if let Some(upload) = file_field(field).await? {
                    file = Some(upload);
                }
            }
            other => {
                return Err(FormError::UnknownField(
                    other.unwrap_or("<unnamed>").to_string(),
                ));
            }
        }
    }

    let portrait = match (file, url_field) {
        (Some(upload), _) => PortraitSource::File(upload),
        (None, Some(url)) if url.trim().is_empty() => PortraitSource::Remove,
        (None, Some(url)) => PortraitSource::Url(url),
        (None, None) => PortraitSource::Unchanged,
    };

    Ok(ChairmanInput {
        name,
        subtitle,
        description,
        is_featured,
        portrait,
    })
}

/// `POST/PUT /api/news`: title, subtitle, imageOrientation, descriptionJson,
/// repeated imageFiles, repeated imageUrls[], and the update keep-set.
pub async fn read_news_form(multipart: &mut Multipart) -> Result<NewsDraft, FormError> {
    let mut draft = NewsDraft::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| FormError::Read(err.to_string()))?
    {
        match field.name() {
            Some("title") => draft.title = text_field(field).await?,
            Some("subtitle") => draft.subtitle = Some(text_field(field).await?),
            Some("imageOrientation") => draft.image_orientation = Some(text_field(field).await?),
            Some("descriptionJson") => draft.description_json = Some(text_field(field).await?),
            Some("existingImageUrlsJson") => draft.keep_json = Some(text_field(field).await?),
            Some("imageUrls[]") | Some("imageUrls") => {
                let url = text_field(field).await?;
                if !url.trim().is_empty() {
                    draft.image_urls.push(url);
                }
            }
            Some("imageFiles") => {
                if let Some(upload) = file_field(field).await? {
                    draft.uploads.push(upload);
                }
            }
            other => {
                return Err(FormError::UnknownField(
                    other.unwrap_or("<unnamed>").to_string(),
                ));
            }
        }
    }

    Ok(draft)
}

/// `POST/PUT /api/projects`: title, category, descriptionJson, detailsJson,
/// repeated imageFiles, repeated imageUrls[], and the update keep-set.
pub async fn read_project_form(multipart: &mut Multipart) -> Result<ProjectDraft, FormError> {
    let mut draft = ProjectDraft::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| FormError::Read(err.to_string()))?
    {
        match field.name() {
            Some("title") => draft.title = text_field(field).await?,
            Some("category") => draft.category = Some(text_field(field).await?),
            Some("descriptionJson") => draft.description_json = Some(text_field(field).await?),
            Some("detailsJson") => draft.details_json = Some(text_field(field).await?),
            Some("existingImageUrlsJson") => draft.keep_json = Some(text_field(field).await?),
            Some("imageUrls[]") | Some("imageUrls") => {
                let url = text_field(field).await?;
                if !url.trim().is_empty() {
                    draft.image_urls.push(url);
                }
            }
            Some("imageFiles") => {
                if let Some(upload) = file_field(field).await? {
                    draft.uploads.push(upload);
                }
            }
            other => {
                return Err(FormError::UnknownField(
                    other.unwrap_or("<unnamed>").to_string(),
                ));
            }
        }
    }

    Ok(draft)
}
