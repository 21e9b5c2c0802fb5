// ABOUTME: Notification storage layer using SQLite
// ABOUTME: Persists per-user notices and tracks which ones have been read

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use casebook_core::generate_id;
use casebook_storage::{StorageError, StorageResult};

use crate::types::{Notification, NotificationCreateInput};

#[derive(Clone)]
pub struct NotificationStorage {
    pool: SqlitePool,
}

impl NotificationStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: NotificationCreateInput) -> StorageResult<Notification> {
        let notification = Notification {
            id: generate_id("ntf"),
            user_id: input.user_id,
            requirement_id: input.requirement_id,
            kind: input.kind,
            actor_id: input.actor_id,
            message: input.message,
            created_at: Utc::now(),
            read_at: None,
        };

        debug!(
            "Creating notification {} for user {}",
            notification.id, notification.user_id
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, requirement_id, kind, actor_id, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.requirement_id)
        .bind(&notification.kind)
        .bind(&notification.actor_id)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(notification)
    }

    pub async fn get(&self, notification_id: &str) -> StorageResult<Notification> {
        let row = sqlx::query("SELECT * FROM notifications WHERE id = ?")
            .bind(notification_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx(e, "notification"))?;

        row_to_notification(&row)
    }

    /// Notifications for a user, newest first, with the unpaginated total
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Notification>, i64)> {
        debug!(
            "Fetching notifications for {} (unread_only: {}, limit: {:?}, offset: {:?})",
            user_id, unread_only, limit, offset
        );

        let unread_clause = if unread_only { " AND read_at IS NULL" } else { "" };

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?{}",
            unread_clause
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut query = format!(
            "SELECT * FROM notifications WHERE user_id = ?{} ORDER BY created_at DESC, rowid DESC",
            unread_clause
        );
        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
            if let Some(off) = offset {
                query.push_str(&format!(" OFFSET {}", off));
            }
        }

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let notifications = rows
            .iter()
            .map(row_to_notification)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((notifications, count))
    }

    pub async fn unread_count(&self, user_id: &str) -> StorageResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Mark one notification read; marking twice keeps the first timestamp
    pub async fn mark_read(&self, notification_id: &str) -> StorageResult<Notification> {
        debug!("Marking notification {} read", notification_id);

        sqlx::query("UPDATE notifications SET read_at = COALESCE(read_at, ?) WHERE id = ?")
            .bind(Utc::now())
            .bind(notification_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.get(notification_id).await
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self, user_id: &str) -> StorageResult<u64> {
        debug!("Marking all notifications read for {}", user_id);

        let result =
            sqlx::query("UPDATE notifications SET read_at = ? WHERE user_id = ? AND read_at IS NULL")
                .bind(Utc::now())
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected())
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Notification> {
    Ok(Notification {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        user_id: row.try_get("user_id").map_err(StorageError::Sqlx)?,
        requirement_id: row.try_get("requirement_id").map_err(StorageError::Sqlx)?,
        kind: row.try_get("kind").map_err(StorageError::Sqlx)?,
        actor_id: row.try_get("actor_id").map_err(StorageError::Sqlx)?,
        message: row.try_get("message").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        read_at: row.try_get("read_at").map_err(StorageError::Sqlx)?,
    })
}
