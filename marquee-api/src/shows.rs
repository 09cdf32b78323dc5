use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ok, ok_message, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/shows", get(list_shows))
        .route("/v1/shows/seats/{id}", get(get_seat_availability))
        .route("/v1/shows/book/{id}", post(book_seats))
        .route("/v1/shows/release/{id}", post(release_seats))
        .route("/v1/shows/{id}", get(get_show))
}

async fn list_shows(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let shows = state.shows.list_shows().await?;
    Ok(ok(shows))
}

async fn get_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let show = state
        .shows
        .get_show(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Show {} not found", id)))?;
    Ok(ok(show))
}

/// GET /v1/shows/seats/:id
/// Full seat grid with per-seat tier and booked flag, plus pricing.
async fn get_seat_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let show = state
        .shows
        .get_show(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Show {} not found", id)))?;
    Ok(ok(show.seat_availability()))
}

#[derive(Debug, Deserialize)]
struct SeatRequest {
    seats: Vec<String>,
}

/// POST /v1/shows/book/:id
/// Raw inventory claim, bypassing the booking ledger. Used by internal
/// tooling; the coordinator is the normal path.
async fn book_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let show = state.shows.claim_seats(id, &req.seats).await?;
    Ok(ok_message(show.seat_availability(), "Seats booked"))
}

/// POST /v1/shows/release/:id
async fn release_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let show = state.shows.release_seats(id, &req.seats).await?;
    Ok(ok_message(show.seat_availability(), "Seats released"))
}
