// ABOUTME: HTTP request handlers for user accounts
// ABOUTME: Registration, lookup, role filtering, and admin-only role changes

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use casebook_users::{UserCreateInput, UserRole};

use crate::auth::CurrentUser;
use crate::db::DbState;
use crate::error::{ApiError, ApiResult};
use crate::response::{created, ok};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Comma-separated roles, e.g. `QA_LEAD,PM`
    pub roles: Option<String>,
}

pub async fn list_users(
    State(db): State<DbState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<impl IntoResponse> {
    let users = match query.roles.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(raw) => {
            let roles = raw
                .split(',')
                .map(UserRole::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            db.user_storage.list_users_by_roles(&roles).await?
        }
        None => db.user_storage.list_users().await?,
    };

    Ok(ok(users))
}

pub async fn create_user(
    State(db): State<DbState>,
    Json(input): Json<UserCreateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating user: {}", input.email);

    let user = db.user_storage.create_user(input).await?;
    Ok(created(user))
}

pub async fn get_user(
    State(db): State<DbState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = db.user_storage.get_user(&user_id).await?;
    Ok(ok(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Change a user's role. Only admins may do this.
pub async fn update_user_role(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let caller = db
        .user_storage
        .find_user(&current.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    if caller.role != UserRole::Admin {
        return Err(ApiError::Forbidden("only admins can change roles".to_string()));
    }

    info!("User {} setting role of {} to {}", caller.id, user_id, request.role);

    let user = db.user_storage.update_role(&user_id, request.role).await?;
    Ok(ok(user))
}
