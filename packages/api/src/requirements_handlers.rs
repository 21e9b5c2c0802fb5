// ABOUTME: HTTP request handlers for requirement management
// ABOUTME: Create, read, list, edit, delete, and reviewer assignment

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use casebook_requirements::{
    RequirementCreateInput, RequirementFilter, RequirementStatus, RequirementUpdateInput,
};

use crate::auth::CurrentUser;
use crate::db::DbState;
use crate::error::ApiResult;
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::{created, ok};

#[derive(Debug, Deserialize)]
pub struct ListRequirementsQuery {
    pub status: Option<RequirementStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_requirements(
    State(db): State<DbState>,
    Path(project_id): Path<String>,
    Query(query): Query<ListRequirementsQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = PaginationParams::from_query(query.page, query.limit);
    info!(
        "Listing requirements for project: {} (page: {}, status: {:?})",
        project_id,
        pagination.page(),
        query.status
    );

    let filter = RequirementFilter {
        status: query.status,
        limit: Some(pagination.limit()),
        offset: Some(pagination.offset()),
    };
    let (requirements, total) = db
        .review_service
        .list_requirements(&project_id, &filter)
        .await?;

    Ok(ok(PaginatedResponse::new(
        requirements,
        &pagination,
        total,
    )))
}

pub async fn create_requirement(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(project_id): Path<String>,
    Json(input): Json<RequirementCreateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating requirement in project {} for {}", project_id, current.id);

    let requirement = db
        .review_service
        .create_requirement(&project_id, &current.id, input)
        .await?;
    Ok(created(requirement))
}

pub async fn get_requirement(
    State(db): State<DbState>,
    Path(requirement_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let requirement = db.review_service.get_requirement(&requirement_id).await?;
    Ok(ok(requirement))
}

pub async fn update_requirement(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(requirement_id): Path<String>,
    Json(input): Json<RequirementUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating requirement {} for {}", requirement_id, current.id);

    let requirement = db
        .review_service
        .update_requirement(&requirement_id, &current.id, input)
        .await?;
    Ok(ok(requirement))
}

pub async fn delete_requirement(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(requirement_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting requirement {} for {}", requirement_id, current.id);

    db.review_service
        .delete_requirement(&requirement_id, &current.id)
        .await?;
    Ok(ok(serde_json::json!({ "deleted": requirement_id })))
}

#[derive(Debug, Deserialize)]
pub struct AssignReviewerRequest {
    #[serde(rename = "reviewerId")]
    pub reviewer_id: Option<String>,
}

pub async fn assign_reviewer(
    State(db): State<DbState>,
    current: CurrentUser,
    Path(requirement_id): Path<String>,
    Json(request): Json<AssignReviewerRequest>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Assigning reviewer {:?} to {} for {}",
        request.reviewer_id, requirement_id, current.id
    );

    let requirement = db
        .review_service
        .assign_reviewer(&requirement_id, &current.id, request.reviewer_id.as_deref())
        .await?;
    Ok(ok(requirement))
}
