use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;

use alexpetro_api_types::{ImageOrientation, NewsBlock};

use crate::application::repos::{CreateNewsParams, NewsRepo, RepoError, UpdateNewsParams};
use crate::domain::entities::{NewsComposite, NewsImageRecord, NewsItemRecord, NewsSummaryRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    subtitle: Option<String>,
    image_orientation: String,
    description: Value,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<NewsRow> for NewsItemRecord {
    type Error = RepoError;

    fn try_from(row: NewsRow) -> Result<Self, Self::Error> {
        let image_orientation =
            ImageOrientation::from_str(&row.image_orientation).map_err(|err| {
                RepoError::Integrity {
                    message: err.to_string(),
                }
            })?;
        let description: Vec<NewsBlock> =
            serde_json::from_value(row.description).map_err(|err| RepoError::Integrity {
                message: format!("stored news description is malformed: {err}"),
            })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            image_orientation,
            description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NewsImageRow {
    id: i64,
    news_id: i64,
    image_url: String,
    position: i32,
}

impl From<NewsImageRow> for NewsImageRecord {
    fn from(row: NewsImageRow) -> Self {
        Self {
            id: row.id,
            news_id: row.news_id,
            image_url: row.image_url,
            position: row.position,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NewsSummaryRow {
    id: i64,
    title: String,
    subtitle: Option<String>,
    image_orientation: String,
    cover_image: Option<String>,
    created_at: OffsetDateTime,
}

const NEWS_COLUMNS: &str =
    "id, title, subtitle, image_orientation, description, created_at, updated_at";

impl PostgresRepositories {
    async fn news_images(
        tx: &mut Transaction<'_, Postgres>,
        news_id: i64,
    ) -> Result<Vec<NewsImageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NewsImageRow>(
            "SELECT id, news_id, image_url, position
             FROM news_images
             WHERE news_id = $1
             ORDER BY position",
        )
        .bind(news_id)
        .fetch_all(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NewsImageRecord::from).collect())
    }

    async fn insert_news_images(
        tx: &mut Transaction<'_, Postgres>,
        news_id: i64,
        urls: &[String],
        start_position: i32,
    ) -> Result<(), RepoError> {
        for (offset, url) in urls.iter().enumerate() {
            sqlx::query("INSERT INTO news_images (news_id, image_url, position) VALUES ($1, $2, $3)")
                .bind(news_id)
                .bind(url)
                .bind(start_position + offset as i32)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl NewsRepo for PostgresRepositories {
    async fn list_news(&self) -> Result<Vec<NewsSummaryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NewsSummaryRow>(
            "SELECT n.id, n.title, n.subtitle, n.image_orientation, n.created_at,
                    (SELECT i.image_url FROM news_images i
                     WHERE i.news_id = n.id
                     ORDER BY i.position LIMIT 1) AS cover_image
             FROM news_items n
             ORDER BY n.id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let image_orientation = ImageOrientation::from_str(&row.image_orientation)
                    .map_err(|err| RepoError::Integrity {
                        message: err.to_string(),
                    })?;
                Ok(NewsSummaryRecord {
                    id: row.id,
                    title: row.title,
                    subtitle: row.subtitle,
                    image_orientation,
                    cover_image: row.cover_image,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn find_news(&self, id: i64) -> Result<Option<NewsComposite>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item = NewsItemRecord::try_from(row)?;
        let images = Self::news_images(&mut tx, id).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Some(NewsComposite { item, images }))
    }

    async fn create_news(&self, params: CreateNewsParams) -> Result<NewsComposite, RepoError> {
        let description = serde_json::to_value(&params.description)
            .map_err(|err| RepoError::from_persistence(err))?;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "INSERT INTO news_items (title, subtitle, image_orientation, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {NEWS_COLUMNS}"
        ))
        .bind(&params.title)
        .bind(&params.subtitle)
        .bind(params.image_orientation.as_str())
        .bind(&description)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let item = NewsItemRecord::try_from(row)?;
        Self::insert_news_images(&mut tx, item.id, &params.image_urls, 0).await?;
        let images = Self::news_images(&mut tx, item.id).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(NewsComposite { item, images })
    }

    async fn update_news(&self, params: UpdateNewsParams) -> Result<NewsComposite, RepoError> {
        let description = serde_json::to_value(&params.description)
            .map_err(|err| RepoError::from_persistence(err))?;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "UPDATE news_items
             SET title = $2, subtitle = $3, image_orientation = $4, description = $5,
                 updated_at = now()
             WHERE id = $1
             RETURNING {NEWS_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.subtitle)
        .bind(params.image_orientation.as_str())
        .bind(&description)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let item = NewsItemRecord::try_from(row)?;

        if !params.remove_image_urls.is_empty() {
            sqlx::query("DELETE FROM news_images WHERE news_id = $1 AND image_url = ANY($2)")
                .bind(params.id)
                .bind(&params.remove_image_urls)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        // Survivors are renumbered into their final order before appending.
        for (position, url) in params.keep_image_urls.iter().enumerate() {
            sqlx::query(
                "UPDATE news_images SET position = $3 WHERE news_id = $1 AND image_url = $2",
            )
            .bind(params.id)
            .bind(url)
            .bind(position as i32)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }

        Self::insert_news_images(
            &mut tx,
            params.id,
            &params.insert_image_urls,
            params.keep_image_urls.len() as i32,
        )
        .await?;

        let images = Self::news_images(&mut tx, params.id).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(NewsComposite { item, images })
    }

    async fn delete_news(&self, id: i64) -> Result<bool, RepoError> {
        // Child rows cascade with the parent.
        let result = sqlx::query("DELETE FROM news_items WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
