// ABOUTME: User storage layer using SQLite
// ABOUTME: Handles account creation, lookup, and role changes

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use casebook_core::{generate_id, normalize_text};
use casebook_storage::{StorageError, StorageResult};

use crate::types::{User, UserCreateInput, UserRole};

#[derive(Clone)]
pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user; a taken email surfaces as `StorageError::Duplicate`
    pub async fn create_user(&self, input: UserCreateInput) -> StorageResult<User> {
        let name = normalize_text(Some(&input.name))
            .ok_or_else(|| StorageError::InvalidInput("name must not be empty".to_string()))?;
        let email = input.email.trim().to_ascii_lowercase();
        if !email.contains('@') {
            return Err(StorageError::InvalidInput(format!(
                "'{}' is not a valid email address",
                input.email
            )));
        }

        let user_id = generate_id("usr");
        let now = Utc::now();

        debug!("Creating user: {} ({}, {})", user_id, email, input.role);

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(&name)
        .bind(&email)
        .bind(input.role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_sqlx(e, &format!("email '{}'", email)))?;

        self.get_user(&user_id).await
    }

    pub async fn get_user(&self, user_id: &str) -> StorageResult<User> {
        debug!("Fetching user: {}", user_id);

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx(e, "user"))?;

        row_to_user(&row)
    }

    /// Like `get_user` but maps a missing row to `None`
    pub async fn find_user(&self, user_id: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        debug!("Fetching user by email: {}", email);

        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn list_users(&self) -> StorageResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_user).collect()
    }

    /// Users holding any of the given roles, ordered by name
    pub async fn list_users_by_roles(&self, roles: &[UserRole]) -> StorageResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE role IN (");
        let mut separated = builder.separated(", ");
        for role in roles {
            separated.push_bind(*role);
        }
        separated.push_unseparated(") ORDER BY name, id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_user).collect()
    }

    pub async fn update_role(&self, user_id: &str, role: UserRole) -> StorageResult<User> {
        debug!("Updating role for user {} to {}", user_id, role);

        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_user(user_id).await
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> StorageResult<User> {
    Ok(User {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        name: row.try_get("name").map_err(StorageError::Sqlx)?,
        email: row.try_get("email").map_err(StorageError::Sqlx)?,
        role: row.try_get("role").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::Sqlx)?,
    })
}
