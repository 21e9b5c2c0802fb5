// ABOUTME: HTTP request handlers for review transitions and acceptance
// ABOUTME: One endpoint per workflow action plus history and allowed-action queries

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use casebook_requirements::{AcceptanceDecision, ReviewActionKind};

use crate::auth::CurrentUser;
use crate::db::DbState;
use crate::error::ApiResult;
use crate::response::ok;

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

async fn transition(
    db: DbState,
    current: CurrentUser,
    requirement_id: String,
    action: ReviewActionKind,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    let comment = body.and_then(|Json(b)| b.comment);
    info!("{} requested on {} by {}", action, requirement_id, current.id);

    let outcome = db
        .review_service
        .apply_review_action(&requirement_id, &current.id, action, comment.as_deref())
        .await?;
    Ok(ok(outcome))
}

pub async fn submit(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Submit, body).await
}

pub async fn approve(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Approve, body).await
}

pub async fn reject(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Reject, body).await
}

pub async fn request_changes(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::RequestChanges, body).await
}

pub async fn start(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Start, body).await
}

pub async fn complete(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Complete, body).await
}

pub async fn reopen(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<CommentRequest>>,
) -> ApiResult<impl IntoResponse> {
    transition(db, current, id, ReviewActionKind::Reopen, body).await
}

pub async fn accept(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<NotesRequest>>,
) -> ApiResult<impl IntoResponse> {
    let notes = body.and_then(|Json(b)| b.notes);
    info!("Acceptance requested on {} by {}", id, current.id);

    let requirement = db
        .review_service
        .accept_requirement(&id, &current.id, notes.as_deref())
        .await?;
    Ok(ok(requirement))
}

pub async fn reject_acceptance(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Option<Json<NotesRequest>>,
) -> ApiResult<impl IntoResponse> {
    let notes = body.and_then(|Json(b)| b.notes);
    info!("Acceptance rejection requested on {} by {}", id, current.id);

    let requirement = db
        .review_service
        .decide_acceptance(&id, &current.id, AcceptanceDecision::Reject, notes.as_deref())
        .await?;
    Ok(ok(requirement))
}

/// Audit trail, oldest first
pub async fn history(
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let actions = db.review_service.load_review_history(&id).await?;
    Ok(ok(actions))
}

/// What the calling user may do next
pub async fn allowed_actions(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let allowed = db.review_service.allowed_actions(&id, &current.id).await?;
    Ok(ok(allowed))
}
