use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateRateParams, RatesRepo, RepoError, UpdateRateParams};
use crate::domain::entities::SharingRateRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct RateRow {
    id: i64,
    title: String,
    percentage: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<RateRow> for SharingRateRecord {
    fn from(row: RateRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            percentage: row.percentage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl RatesRepo for PostgresRepositories {
    async fn list_rates(&self) -> Result<Vec<SharingRateRecord>, RepoError> {
        let rows = sqlx::query_as::<_, RateRow>(
            "SELECT id, title, percentage, created_at, updated_at
             FROM sharing_rates
             ORDER BY id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SharingRateRecord::from).collect())
    }

    async fn create_rate(&self, params: CreateRateParams) -> Result<SharingRateRecord, RepoError> {
        let row = sqlx::query_as::<_, RateRow>(
            "INSERT INTO sharing_rates (title, percentage)
             VALUES ($1, $2)
             RETURNING id, title, percentage, created_at, updated_at",
        )
        .bind(&params.title)
        .bind(params.percentage)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SharingRateRecord::from(row))
    }

    async fn update_rate(&self, params: UpdateRateParams) -> Result<SharingRateRecord, RepoError> {
        let row = sqlx::query_as::<_, RateRow>(
            "UPDATE sharing_rates
             SET title = $2, percentage = $3, updated_at = now()
             WHERE id = $1
             RETURNING id, title, percentage, created_at, updated_at",
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(params.percentage)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SharingRateRecord::from(row))
    }

    async fn delete_rate(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM sharing_rates WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
