use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use alexpetro_api_types::ContactStats;

use crate::application::repos::{
    ContactQueryFilter, ContactsRepo, CreateContactParams, RepoError,
};
use crate::domain::entities::ContactRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    name: String,
    email: String,
    subject: String,
    message: String,
    is_replied: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ContactRow> for ContactRecord {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            is_replied: row.is_replied,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CONTACT_COLUMNS: &str =
    "id, name, email, subject, message, is_replied, created_at, updated_at";

#[async_trait]
impl ContactsRepo for PostgresRepositories {
    async fn create_contact(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "INSERT INTO contact_messages (name, email, subject, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(&params.email)
        .bind(&params.subject)
        .bind(&params.message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactRecord::from(row))
    }

    async fn list_contacts(
        &self,
        filter: &ContactQueryFilter,
    ) -> Result<Vec<ContactRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE TRUE"
        ));

        if let Some(search) = filter.search.as_ref() {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR subject ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(is_replied) = filter.is_replied {
            qb.push(" AND is_replied = ");
            qb.push_bind(is_replied);
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(filter.limit.clamp(1, 100));
        qb.push(" OFFSET ");
        qb.push_bind(filter.offset.max(0));

        let rows = qb
            .build_query_as::<ContactRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ContactRecord::from).collect())
    }

    async fn find_contact(&self, id: i64) -> Result<Option<ContactRecord>, RepoError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ContactRecord::from))
    }

    async fn set_contact_replied(
        &self,
        id: i64,
        is_replied: bool,
    ) -> Result<ContactRecord, RepoError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contact_messages
             SET is_replied = $2, updated_at = now()
             WHERE id = $1
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .bind(is_replied)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactRecord::from(row))
    }

    async fn delete_contact(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn contact_stats(&self) -> Result<ContactStats, RepoError> {
        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total: i64,
            unreplied: i64,
            today: i64,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT
                 COUNT(*) AS total,
                 COUNT(*) FILTER (WHERE NOT is_replied) AS unreplied,
                 COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS today
             FROM contact_messages",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactStats {
            total: row.total,
            unreplied: row.unreplied,
            today: row.today,
        })
    }
}
