use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Health check endpoint; also pings the database when one is configured
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    if let Some(pool) = &state.db_pool {
        pool.health_check().await.map_err(|e| {
            ErrorResponse::new("service_unavailable", 0, format!("Database unavailable: {}", e))
        })?;
    }
    Ok((StatusCode::OK, "OK"))
}
