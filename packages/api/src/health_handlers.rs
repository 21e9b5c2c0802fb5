// ABOUTME: Liveness endpoint
// ABOUTME: Reports service version and whether the database answers

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::error;

use crate::db::DbState;
use crate::response::ok;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

pub async fn health(State(db): State<DbState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&db.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            error!("Health check query failed: {}", e);
            "unavailable"
        }
    };

    ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
