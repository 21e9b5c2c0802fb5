// ABOUTME: HTTP request handlers for in-app notifications
// ABOUTME: Users read and acknowledge only their own notifications

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use casebook_notifications::Notification;

use crate::auth::CurrentUser;
use crate::db::DbState;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PaginationMeta, PaginationParams};
use crate::response::ok;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub data: Vec<Notification>,
    pub pagination: PaginationMeta,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

fn ensure_self(current: &CurrentUser, user_id: &str) -> ApiResult<()> {
    if current.id != user_id {
        return Err(ApiError::Forbidden(
            "notifications belong to another user".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_notifications(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<impl IntoResponse> {
    ensure_self(&current, &user_id)?;

    let pagination = PaginationParams::from_query(query.page, query.limit);
    let (data, total) = db
        .notification_storage
        .list_for_user(
            &user_id,
            query.unread_only,
            Some(pagination.limit()),
            Some(pagination.offset()),
        )
        .await?;
    let unread_count = db.notification_storage.unread_count(&user_id).await?;

    Ok(ok(NotificationList {
        data,
        pagination: PaginationMeta::new(&pagination, total),
        unread_count,
    }))
}

pub async fn mark_all_read(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    ensure_self(&current, &user_id)?;

    let updated = db.notification_storage.mark_all_read(&user_id).await?;
    info!("Marked {} notification(s) read for {}", updated, user_id);
    Ok(ok(MarkAllReadResponse { updated }))
}

pub async fn mark_read(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(notification_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let notification = db.notification_storage.get(&notification_id).await?;
    ensure_self(&current, &notification.user_id)?;

    let notification = db.notification_storage.mark_read(&notification_id).await?;
    Ok(ok(notification))
}
