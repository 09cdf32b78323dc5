use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use marquee_catalog::pricing::PricingTiers;
use marquee_catalog::seating::SeatLayout;
use marquee_catalog::show::{Show, ShowUpdate, TheaterInfo};

use crate::error::{ok_message, AppError};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/shows", post(create_show))
        .route("/v1/admin/shows/{id}", put(update_show).delete(delete_show))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            crate::middleware::admin_auth_middleware,
        ))
}

#[derive(Debug, Deserialize)]
struct CreateShowRequest {
    movie_id: String,
    theater: TheaterInfo,
    show_date: chrono::NaiveDate,
    show_time: String,
    language: String,
    format: String,
    layout: SeatLayout,
    pricing: PricingTiers,
}

/// POST /v1/admin/shows
async fn create_show(
    State(state): State<AppState>,
    Json(req): Json<CreateShowRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if req.layout.rows.is_empty() || req.layout.seats_per_row <= 0 {
        return Err(AppError::ValidationError(
            "Layout needs at least one row and one seat per row".to_string(),
        ));
    }
    if !req.pricing.is_valid() {
        return Err(AppError::ValidationError(
            "Prices cannot be negative".to_string(),
        ));
    }

    let show = Show::new(
        req.movie_id,
        req.theater,
        req.show_date,
        req.show_time,
        req.language,
        req.format,
        req.layout,
        req.pricing,
    );
    state.shows.create_show(&show).await?;

    Ok((StatusCode::CREATED, ok_message(show, "Show created")))
}

/// PUT /v1/admin/shows/:id
/// Metadata edits only; the seat inventory is never touched here.
async fn update_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ShowUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let show = state.shows.update_show(id, &update).await?;
    Ok(ok_message(show, "Show updated"))
}

/// DELETE /v1/admin/shows/:id
/// Refused while any booking, cancelled ones included, references the show.
async fn delete_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.bookings.bookings_exist_for_show(id).await? {
        return Err(AppError::ConflictError(
            "Show has bookings and cannot be deleted".to_string(),
        ));
    }
    state.shows.delete_show(id).await?;
    Ok(ok_message(serde_json::json!({"id": id}), "Show deleted"))
}
