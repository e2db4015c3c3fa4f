use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{RepoError, TickerRepo};
use crate::domain::entities::TickerRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TickerRow {
    id: i64,
    message: String,
    created_at: OffsetDateTime,
}

impl From<TickerRow> for TickerRecord {
    fn from(row: TickerRow) -> Self {
        Self {
            id: row.id,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TickerRepo for PostgresRepositories {
    async fn list_messages(&self) -> Result<Vec<TickerRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TickerRow>(
            "SELECT id, message, created_at FROM news_ticker ORDER BY id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TickerRecord::from).collect())
    }

    async fn create_message(&self, message: String) -> Result<TickerRecord, RepoError> {
        let row = sqlx::query_as::<_, TickerRow>(
            "INSERT INTO news_ticker (message) VALUES ($1)
             RETURNING id, message, created_at",
        )
        .bind(&message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TickerRecord::from(row))
    }

    async fn update_message(&self, id: i64, message: String) -> Result<TickerRecord, RepoError> {
        let row = sqlx::query_as::<_, TickerRow>(
            "UPDATE news_ticker SET message = $2 WHERE id = $1
             RETURNING id, message, created_at",
        )
        .bind(id)
        .bind(&message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TickerRecord::from(row))
    }

    async fn delete_message(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM news_ticker WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
