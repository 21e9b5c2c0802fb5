// ABOUTME: HTTP API layer for Casebook providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    http::{header::InvalidHeaderValue, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod db;
pub mod error;
pub mod health_handlers;
pub mod notifications_handlers;
pub mod pagination;
pub mod requirements_handlers;
pub mod response;
pub mod review_handlers;
pub mod users_handlers;

pub use db::DbState;
pub use error::{ApiError, ApiResult};

/// Creates the users API router (nested under /api/users)
pub fn create_users_router() -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(users_handlers::list_users).post(users_handlers::create_user),
        )
        .route("/{user_id}", get(users_handlers::get_user))
        .route("/{user_id}/role", put(users_handlers::update_user_role))
        .route(
            "/{user_id}/notifications",
            get(notifications_handlers::list_notifications),
        )
        .route(
            "/{user_id}/notifications/read-all",
            post(notifications_handlers::mark_all_read),
        )
}

/// Creates the project-scoped requirements router
/// (nested under /api/projects/{project_id}/requirements)
pub fn create_project_requirements_router() -> Router<DbState> {
    Router::new().route(
        "/",
        get(requirements_handlers::list_requirements)
            .post(requirements_handlers::create_requirement),
    )
}

/// Creates the requirements API router (nested under /api/requirements)
pub fn create_requirements_router() -> Router<DbState> {
    Router::new()
        .route(
            "/{id}",
            get(requirements_handlers::get_requirement)
                .put(requirements_handlers::update_requirement)
                .delete(requirements_handlers::delete_requirement),
        )
        .route("/{id}/reviewer", put(requirements_handlers::assign_reviewer))
        // Review workflow
        .route("/{id}/submit", post(review_handlers::submit))
        .route("/{id}/approve", post(review_handlers::approve))
        .route("/{id}/reject", post(review_handlers::reject))
        .route("/{id}/request-changes", post(review_handlers::request_changes))
        .route("/{id}/start", post(review_handlers::start))
        .route("/{id}/complete", post(review_handlers::complete))
        .route("/{id}/reopen", post(review_handlers::reopen))
        // Acceptance
        .route("/{id}/accept", post(review_handlers::accept))
        .route(
            "/{id}/reject-acceptance",
            post(review_handlers::reject_acceptance),
        )
        // Queries
        .route("/{id}/history", get(review_handlers::history))
        .route("/{id}/actions", get(review_handlers::allowed_actions))
}

/// Creates the notifications API router (nested under /api/notifications)
pub fn create_notifications_router() -> Router<DbState> {
    Router::new().route(
        "/{notification_id}/read",
        post(notifications_handlers::mark_read),
    )
}

/// Full application router with tracing and CORS applied
pub fn create_app(state: DbState, cors_origin: &str) -> Result<Router, InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/health", get(health_handlers::health))
        .nest("/api/users", create_users_router())
        .nest(
            "/api/projects/{project_id}/requirements",
            create_project_requirements_router(),
        )
        .nest("/api/requirements", create_requirements_router())
        .nest("/api/notifications", create_notifications_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}
