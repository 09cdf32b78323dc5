use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use marquee_booking::coordinator::CreateBookingRequest;
use marquee_booking::models::PaymentState;
use marquee_shared::models::events::{BookingCancelledEvent, SeatsClaimedEvent};

use crate::error::{ok, ok_message, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/verify", get(verify_booking))
        .route("/v1/bookings/user/{user_id}", get(list_user_bookings))
        .route("/v1/bookings/user/{user_id}/active", get(list_active_bookings))
        .route("/v1/bookings/user/{user_id}/past", get(list_past_bookings))
        .route("/v1/bookings/summary/{id}", get(get_booking_summary))
        .route(
            "/v1/bookings/{id}",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
        .route("/v1/bookings/{id}/payment", put(update_payment_status))
}

/// POST /v1/bookings
/// Direct booking: seats are claimed immediately, payment settles later.
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let booking = state.coordinator.create_booking(&req).await?;

    if let Some(events) = &state.events {
        events
            .seats_claimed(&SeatsClaimedEvent {
                show_id: booking.show_id,
                booking_id: booking.id,
                seats: booking.seats.clone(),
                claimed_at: Utc::now().timestamp(),
            })
            .await;
    }

    Ok((StatusCode::CREATED, ok_message(booking, "Booking created")))
}

/// GET /v1/bookings/:id
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;
    Ok(ok(booking))
}

/// GET /v1/bookings/summary/:id
async fn get_booking_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;
    Ok(ok(booking.summary(Utc::now())))
}

async fn list_user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = state.bookings.list_user_bookings(&user_id).await?;
    Ok(ok(bookings))
}

async fn list_active_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = state.bookings.list_active_bookings(&user_id).await?;
    Ok(ok(bookings))
}

async fn list_past_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = state.bookings.list_past_bookings(&user_id).await?;
    Ok(ok(bookings))
}

#[derive(Debug, Deserialize)]
struct UpdateBookingRequest {
    special_requests: Option<String>,
}

/// PUT /v1/bookings/:id
/// Only the special-requests note is editable after creation.
async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .bookings
        .update_special_requests(id, req.special_requests.as_deref())
        .await?;

    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;
    Ok(ok_message(booking, "Booking updated"))
}

#[derive(Debug, Deserialize)]
struct UpdatePaymentStatusRequest {
    payment_status: String,
    payment_reference: Option<String>,
}

/// PUT /v1/bookings/:id/payment
/// Direct-flow settlement report from the client. A completed payment
/// confirms the booking.
async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = PaymentState::parse(&req.payment_status).ok_or_else(|| {
        AppError::ValidationError(format!("Invalid payment status {}", req.payment_status))
    })?;

    state
        .bookings
        .update_payment_status(id, status, req.payment_reference.as_deref())
        .await?;

    let mut booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;

    if status == PaymentState::Completed {
        booking.mark_confirmed();
        state.bookings.update_booking(&booking).await?;
    }

    Ok(ok_message(booking, "Payment status updated"))
}

/// DELETE /v1/bookings/:id
/// Cancel with partial refund; the seats go back to the pool.
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state.coordinator.cancel_booking(id).await?;

    if let Some(events) = &state.events {
        events
            .booking_cancelled(&BookingCancelledEvent {
                booking_id: booking.id,
                show_id: booking.show_id,
                user_id: booking.user_id.clone(),
                seats: booking.seats.clone(),
                refund_amount: booking.refund_amount,
                timestamp: Utc::now().timestamp(),
            })
            .await;
    }

    Ok(ok_message(booking, "Booking cancelled"))
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    booking_id: Uuid,
    user_id: String,
}

/// GET /v1/bookings/verify?booking_id=&user_id=
/// Ownership check for ticket scanning; 403 when the booking belongs to
/// someone else.
async fn verify_booking(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state.identity.get_user(&params.user_id).await?;

    let booking = state
        .bookings
        .get_booking(params.booking_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError(format!("Booking {} not found", params.booking_id))
        })?;

    if booking.user_id != user.id {
        return Err(AppError::AuthorizationError(
            "Booking belongs to a different user".to_string(),
        ));
    }

    Ok(ok(booking))
}
