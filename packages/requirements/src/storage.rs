// ABOUTME: Requirement storage layer using SQLite
// ABOUTME: Version-checked writes and transactional transitions with their audit records

use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use casebook_storage::{StorageError, StorageResult};

use crate::store::{RequirementFilter, ReviewStore, TransitionCommit};
use crate::types::{RequirementDetails, ReviewAction, Requirement};

#[derive(Clone)]
pub struct RequirementStorage {
    pool: SqlitePool,
}

impl RequirementStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch regardless of soft deletion
    async fn fetch_any(&self, requirement_id: &str) -> StorageResult<Requirement> {
        fetch_requirement(&self.pool, requirement_id).await
    }
}

async fn fetch_requirement<'e, E>(executor: E, requirement_id: &str) -> StorageResult<Requirement>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT * FROM requirements WHERE id = ?")
        .bind(requirement_id)
        .fetch_one(executor)
        .await
        .map_err(|e| StorageError::from_sqlx(e, "requirement"))?;

    row_to_requirement(&row)
}

#[async_trait]
impl ReviewStore for RequirementStorage {
    async fn insert_requirement(&self, requirement: &Requirement) -> StorageResult<()> {
        debug!(
            "Creating requirement: {} (project: {})",
            requirement.id, requirement.project_id
        );

        let details = serde_json::to_string(&requirement.details)?;

        sqlx::query(
            r#"
            INSERT INTO requirements (
                id, project_id, title, description, priority, details,
                status, acceptance_status, author_id, reviewer_id,
                reviewed_at, accepted_at, acceptance_notes, version,
                created_at, updated_at, deleted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&requirement.id)
        .bind(&requirement.project_id)
        .bind(&requirement.title)
        .bind(&requirement.description)
        .bind(requirement.priority)
        .bind(details)
        .bind(requirement.status)
        .bind(requirement.acceptance_status)
        .bind(&requirement.author_id)
        .bind(&requirement.reviewer_id)
        .bind(requirement.reviewed_at)
        .bind(requirement.accepted_at)
        .bind(&requirement.acceptance_notes)
        .bind(requirement.version)
        .bind(requirement.created_at)
        .bind(requirement.updated_at)
        .bind(requirement.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_sqlx(e, &format!("requirement '{}'", requirement.id)))?;

        Ok(())
    }

    async fn get_requirement(&self, requirement_id: &str) -> StorageResult<Option<Requirement>> {
        debug!("Fetching requirement: {}", requirement_id);

        let row = sqlx::query("SELECT * FROM requirements WHERE id = ? AND deleted_at IS NULL")
            .bind(requirement_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_requirement).transpose()
    }

    async fn list_requirements(
        &self,
        project_id: &str,
        filter: &RequirementFilter,
    ) -> StorageResult<(Vec<Requirement>, i64)> {
        debug!(
            "Fetching requirements for project {} (status: {:?}, limit: {:?}, offset: {:?})",
            project_id, filter.status, filter.limit, filter.offset
        );

        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM requirements WHERE deleted_at IS NULL AND project_id = ",
        );
        count_query.push_bind(project_id);
        if let Some(status) = filter.status {
            count_query.push(" AND status = ").push_bind(status);
        }

        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM requirements WHERE deleted_at IS NULL AND project_id = ");
        query.push_bind(project_id);
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = filter.offset {
                query.push(" OFFSET ").push_bind(offset);
            }
        }

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let requirements = rows
            .iter()
            .map(row_to_requirement)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((requirements, count))
    }

    async fn save_requirement(
        &self,
        requirement: &Requirement,
        expected_version: i64,
    ) -> StorageResult<Requirement> {
        debug!(
            "Saving requirement {} at version {}",
            requirement.id, expected_version
        );

        let details = serde_json::to_string(&requirement.details)?;

        let result = sqlx::query(
            r#"
            UPDATE requirements
            SET title = ?, description = ?, priority = ?, details = ?,
                acceptance_status = ?, reviewer_id = ?, accepted_at = ?,
                acceptance_notes = ?, updated_at = ?, deleted_at = ?,
                version = version + 1
            WHERE id = ? AND version = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&requirement.title)
        .bind(&requirement.description)
        .bind(requirement.priority)
        .bind(details)
        .bind(requirement.acceptance_status)
        .bind(&requirement.reviewer_id)
        .bind(requirement.accepted_at)
        .bind(&requirement.acceptance_notes)
        .bind(requirement.updated_at)
        .bind(requirement.deleted_at)
        .bind(&requirement.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::VersionConflict(requirement.id.clone()));
        }

        self.fetch_any(&requirement.id).await
    }

    async fn commit_transition(&self, commit: TransitionCommit) -> StorageResult<Requirement> {
        debug!(
            "Committing {} on {}: {} -> {}",
            commit.action.action, commit.requirement_id, commit.expected_status, commit.to_status
        );

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE requirements
            SET status = ?, reviewed_at = COALESCE(?, reviewed_at),
                updated_at = ?, version = version + 1
            WHERE id = ? AND status = ? AND version = ? AND deleted_at IS NULL
            "#,
        )
        .bind(commit.to_status)
        .bind(commit.reviewed_at)
        .bind(commit.updated_at)
        .bind(&commit.requirement_id)
        .bind(commit.expected_status)
        .bind(commit.expected_version)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Err(StorageError::VersionConflict(commit.requirement_id));
        }

        let action = &commit.action;
        sqlx::query(
            r#"
            INSERT INTO review_actions (
                id, requirement_id, reviewer_id, action, comment,
                from_status, to_status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&action.id)
        .bind(&action.requirement_id)
        .bind(&action.reviewer_id)
        .bind(action.action)
        .bind(&action.comment)
        .bind(action.from_status)
        .bind(action.to_status)
        .bind(action.created_at)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        // Read back inside the transaction so the row matches the record just written
        let updated = fetch_requirement(&mut *tx, &commit.requirement_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(updated)
    }

    async fn list_review_actions(&self, requirement_id: &str) -> StorageResult<Vec<ReviewAction>> {
        debug!("Fetching review history for {}", requirement_id);

        let rows = sqlx::query(
            "SELECT * FROM review_actions WHERE requirement_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(requirement_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_review_action).collect()
    }
}

fn row_to_requirement(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Requirement> {
    let raw_details: String = row.try_get("details").map_err(StorageError::Sqlx)?;
    let details: RequirementDetails = serde_json::from_str(&raw_details)?;

    Ok(Requirement {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        project_id: row.try_get("project_id").map_err(StorageError::Sqlx)?,
        title: row.try_get("title").map_err(StorageError::Sqlx)?,
        description: row.try_get("description").map_err(StorageError::Sqlx)?,
        priority: row.try_get("priority").map_err(StorageError::Sqlx)?,
        details,
        status: row.try_get("status").map_err(StorageError::Sqlx)?,
        acceptance_status: row.try_get("acceptance_status").map_err(StorageError::Sqlx)?,
        author_id: row.try_get("author_id").map_err(StorageError::Sqlx)?,
        reviewer_id: row.try_get("reviewer_id").map_err(StorageError::Sqlx)?,
        reviewed_at: row.try_get("reviewed_at").map_err(StorageError::Sqlx)?,
        accepted_at: row.try_get("accepted_at").map_err(StorageError::Sqlx)?,
        acceptance_notes: row.try_get("acceptance_notes").map_err(StorageError::Sqlx)?,
        version: row.try_get("version").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::Sqlx)?,
        deleted_at: row.try_get("deleted_at").map_err(StorageError::Sqlx)?,
    })
}

fn row_to_review_action(row: &sqlx::sqlite::SqliteRow) -> StorageResult<ReviewAction> {
    Ok(ReviewAction {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        requirement_id: row.try_get("requirement_id").map_err(StorageError::Sqlx)?,
        reviewer_id: row.try_get("reviewer_id").map_err(StorageError::Sqlx)?,
        action: row.try_get("action").map_err(StorageError::Sqlx)?,
        comment: row.try_get("comment").map_err(StorageError::Sqlx)?,
        from_status: row.try_get("from_status").map_err(StorageError::Sqlx)?,
        to_status: row.try_get("to_status").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
    })
}
