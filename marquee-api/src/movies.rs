use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{ok, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/movies/{id}", get(get_movie))
}

/// GET /v1/movies/:id
/// Catalog gateway passthrough; a catalog outage surfaces as 502.
async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let movie = state
        .catalog
        .get_movie(&id)
        .await
        .map_err(|e| AppError::UpstreamError(format!("Movie catalog unavailable: {}", e)))?
        .ok_or_else(|| AppError::NotFoundError(format!("Movie {} not found", id)))?;

    Ok(ok(movie))
}
