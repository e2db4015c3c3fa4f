use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    ChairmenRepo, CreateChairmanParams, RepoError, UpdateChairmanParams,
};
use crate::domain::entities::ChairmanRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ChairmanRow {
    id: i64,
    name: String,
    subtitle: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    is_featured: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ChairmanRow> for ChairmanRecord {
    fn from(row: ChairmanRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            subtitle: row.subtitle,
            description: row.description,
            image_url: row.image_url,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CHAIRMAN_COLUMNS: &str =
    "id, name, subtitle, description, image_url, is_featured, created_at, updated_at";

#[async_trait]
impl ChairmenRepo for PostgresRepositories {
    async fn list_chairmen(&self) -> Result<Vec<ChairmanRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ChairmanRow>(&format!(
            "SELECT {CHAIRMAN_COLUMNS} FROM chairmen ORDER BY id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ChairmanRecord::from).collect())
    }

    async fn find_chairman(&self, id: i64) -> Result<Option<ChairmanRecord>, RepoError> {
        let row = sqlx::query_as::<_, ChairmanRow>(&format!(
            "SELECT {CHAIRMAN_COLUMNS} FROM chairmen WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ChairmanRecord::from))
    }

    async fn create_chairman(
        &self,
        params: CreateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        if params.is_featured {
            sqlx::query("UPDATE chairmen SET is_featured = FALSE WHERE is_featured")
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        let row = sqlx::query_as::<_, ChairmanRow>(&format!(
            "INSERT INTO chairmen (name, subtitle, description, image_url, is_featured)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CHAIRMAN_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(&params.subtitle)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(params.is_featured)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ChairmanRecord::from(row))
    }

    async fn update_chairman(
        &self,
        params: UpdateChairmanParams,
    ) -> Result<ChairmanRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        if params.is_featured {
            sqlx::query("UPDATE chairmen SET is_featured = FALSE WHERE is_featured AND id <> $1")
                .bind(params.id)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        let row = sqlx::query_as::<_, ChairmanRow>(&format!(
            "UPDATE chairmen
             SET name = $2, subtitle = $3, description = $4, image_url = $5,
                 is_featured = $6, updated_at = now()
             WHERE id = $1
             RETURNING {CHAIRMAN_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.subtitle)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(params.is_featured)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ChairmanRecord::from(row))
    }

    async fn delete_chairman(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM chairmen WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
