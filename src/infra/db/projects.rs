use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;

use alexpetro_api_types::ProjectCategory;

use crate::application::repos::{
    CreateProjectParams, ProjectsRepo, RepoError, UpdateProjectParams,
};
use crate::domain::entities::{
    ProjectComposite, ProjectDetailRecord, ProjectImageRecord, ProjectRecord, ProjectSummaryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    title: String,
    category: String,
    description: Value,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProjectRow> for ProjectRecord {
    type Error = RepoError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let category = ProjectCategory::from_str(&row.category).map_err(|err| {
            RepoError::Integrity {
                message: err.to_string(),
            }
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            category,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProjectImageRow {
    id: i64,
    project_id: i64,
    image_url: String,
    position: i32,
}

#[derive(sqlx::FromRow)]
struct ProjectDetailRow {
    id: i64,
    project_id: i64,
    detail_key: String,
    detail_value: String,
    position: i32,
}

#[derive(sqlx::FromRow)]
struct ProjectSummaryRow {
    id: i64,
    title: String,
    category: String,
    description: Value,
    cover_image: Option<String>,
    created_at: OffsetDateTime,
}

const PROJECT_COLUMNS: &str = "id, title, category, description, created_at, updated_at";

impl PostgresRepositories {
    async fn project_children(
        tx: &mut Transaction<'_, Postgres>,
        project_id: i64,
    ) -> Result<(Vec<ProjectImageRecord>, Vec<ProjectDetailRecord>), RepoError> {
        let images = sqlx::query_as::<_, ProjectImageRow>(
            "SELECT id, project_id, image_url, position
             FROM project_images
             WHERE project_id = $1
             ORDER BY position",
        )
        .bind(project_id)
        .fetch_all(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let details = sqlx::query_as::<_, ProjectDetailRow>(
            "SELECT id, project_id, detail_key, detail_value, position
             FROM project_details
             WHERE project_id = $1
             ORDER BY position",
        )
        .bind(project_id)
        .fetch_all(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Ok((
            images
                .into_iter()
                .map(|row| ProjectImageRecord {
                    id: row.id,
                    project_id: row.project_id,
                    image_url: row.image_url,
                    position: row.position,
                })
                .collect(),
            details
                .into_iter()
                .map(|row| ProjectDetailRecord {
                    id: row.id,
                    project_id: row.project_id,
                    detail_key: row.detail_key,
                    detail_value: row.detail_value,
                    position: row.position,
                })
                .collect(),
        ))
    }

    async fn insert_project_images(
        tx: &mut Transaction<'_, Postgres>,
        project_id: i64,
        urls: &[String],
        start_position: i32,
    ) -> Result<(), RepoError> {
        for (offset, url) in urls.iter().enumerate() {
            sqlx::query(
                "INSERT INTO project_images (project_id, image_url, position) VALUES ($1, $2, $3)",
            )
            .bind(project_id)
            .bind(url)
            .bind(start_position + offset as i32)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }
        Ok(())
    }

    /// Detail rows carry no identity worth preserving; replace them wholesale.
    async fn replace_project_details(
        tx: &mut Transaction<'_, Postgres>,
        project_id: i64,
        details: &[(String, String)],
    ) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM project_details WHERE project_id = $1")
            .bind(project_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        for (position, (key, value)) in details.iter().enumerate() {
            sqlx::query(
                "INSERT INTO project_details (project_id, detail_key, detail_value, position)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(project_id)
            .bind(key)
            .bind(value)
            .bind(position as i32)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectsRepo for PostgresRepositories {
    async fn list_projects(
        &self,
        category: Option<ProjectCategory>,
    ) -> Result<Vec<ProjectSummaryRecord>, RepoError> {
        let base = "SELECT p.id, p.title, p.category, p.description, p.created_at,
                    (SELECT i.image_url FROM project_images i
                     WHERE i.project_id = p.id
                     ORDER BY i.position LIMIT 1) AS cover_image
             FROM projects p";

        let rows = match category {
            Some(filter) => {
                sqlx::query_as::<_, ProjectSummaryRow>(&format!(
                    "{base} WHERE p.category = $1 ORDER BY p.id DESC"
                ))
                .bind(filter.as_str())
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, ProjectSummaryRow>(&format!("{base} ORDER BY p.id DESC"))
                    .fetch_all(self.pool())
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                let category = ProjectCategory::from_str(&row.category).map_err(|err| {
                    RepoError::Integrity {
                        message: err.to_string(),
                    }
                })?;
                Ok(ProjectSummaryRecord {
                    id: row.id,
                    title: row.title,
                    category,
                    description: row.description,
                    cover_image: row.cover_image,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectComposite>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let project = ProjectRecord::try_from(row)?;
        let (images, details) = Self::project_children(&mut tx, id).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Some(ProjectComposite {
            project,
            images,
            details,
        }))
    }

    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectComposite, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "INSERT INTO projects (title, category, description)
             VALUES ($1, $2, $3)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&params.title)
        .bind(params.category.as_str())
        .bind(&params.description)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let project = ProjectRecord::try_from(row)?;
        Self::insert_project_images(&mut tx, project.id, &params.image_urls, 0).await?;
        Self::replace_project_details(&mut tx, project.id, &params.details).await?;
        let (images, details) = Self::project_children(&mut tx, project.id).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ProjectComposite {
            project,
            images,
            details,
        })
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectComposite, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects
             SET title = $2, category = $3, description = $4, updated_at = now()
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(params.category.as_str())
        .bind(&params.description)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        let project = ProjectRecord::try_from(row)?;

        if !params.remove_image_urls.is_empty() {
            sqlx::query("DELETE FROM project_images WHERE project_id = $1 AND image_url = ANY($2)")
                .bind(params.id)
                .bind(&params.remove_image_urls)
                .execute(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;
        }

        for (position, url) in params.keep_image_urls.iter().enumerate() {
            sqlx::query(
                "UPDATE project_images SET position = $3 WHERE project_id = $1 AND image_url = $2",
            )
            .bind(params.id)
            .bind(url)
            .bind(position as i32)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }

        Self::insert_project_images(
            &mut tx,
            params.id,
            &params.insert_image_urls,
            params.keep_image_urls.len() as i32,
        )
        .await?;

        Self::replace_project_details(&mut tx, params.id, &params.details).await?;

        let (images, details) = Self::project_children(&mut tx, params.id).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ProjectComposite {
            project,
            images,
            details,
        })
    }

    async fn delete_project(&self, id: i64) -> Result<bool, RepoError> {
        // Child rows cascade with the parent.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
