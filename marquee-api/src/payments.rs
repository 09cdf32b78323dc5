use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use marquee_booking::coordinator::CreateBookingRequest;
use marquee_shared::models::events::{BookingConfirmedEvent, PaymentSettledEvent};

use crate::error::{ok, ok_message, AppError};
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "marquee-signature";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/create-payment-intent", post(create_payment_intent))
        .route("/v1/payments/confirm-payment", post(confirm_payment))
        .route("/v1/payments/cancel/{booking_id}", post(cancel_payment))
        .route("/v1/payments/refund/{booking_id}", post(refund_payment))
        .route("/v1/payments/webhook", post(handle_webhook))
}

/// POST /v1/payments/create-payment-intent
/// Flow B entry point: booking row plus external intent, seats unclaimed
/// until the payment settles.
async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let (booking, intent) = state.coordinator.create_payment_gated_booking(&req).await?;

    Ok((
        StatusCode::CREATED,
        ok(serde_json::json!({
            "booking": booking,
            "payment_intent_id": intent.id,
            "client_secret": intent.client_secret,
            "amount": intent.amount_minor,
            "currency": intent.currency,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct ConfirmPaymentRequest {
    payment_intent_id: String,
    booking_id: Uuid,
}

/// POST /v1/payments/confirm-payment
/// Direct settlement channel. The gateway is consulted for the real intent
/// status; the client's claim alone is never trusted.
async fn confirm_payment(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = state
        .reconciler
        .confirm_payment(&req.payment_intent_id, req.booking_id)
        .await?;

    if let Some(events) = &state.events {
        events
            .booking_confirmed(&BookingConfirmedEvent {
                booking_id: booking.id,
                show_id: booking.show_id,
                user_id: booking.user_id.clone(),
                seats: booking.seats.clone(),
                total_price: booking.total_price,
                timestamp: Utc::now().timestamp(),
            })
            .await;
        events
            .payment_settled(&PaymentSettledEvent {
                booking_id: booking.id,
                payment_reference: req.payment_intent_id.clone(),
                outcome: booking.payment_status.as_str().to_string(),
                amount: booking.total_price,
                timestamp: Utc::now().timestamp(),
            })
            .await;
    }

    Ok(ok_message(booking, "Payment confirmed"))
}

/// POST /v1/payments/cancel/:booking_id
/// Abandon an in-flight payment-gated booking before it settles.
async fn cancel_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.reconciler.cancel_before_payment(booking_id).await?;
    Ok(ok_message(
        serde_json::json!({"booking_id": booking_id}),
        "Booking abandoned before payment",
    ))
}

#[derive(Debug, Default, Deserialize)]
struct RefundRequest {
    reason: Option<String>,
}

/// POST /v1/payments/refund/:booking_id
async fn refund_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<RefundRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let reason = body.and_then(|Json(r)| r.reason);
    let booking = state
        .reconciler
        .refund_booking(booking_id, reason.as_deref())
        .await?;

    if let Some(events) = &state.events {
        events
            .payment_settled(&PaymentSettledEvent {
                booking_id: booking.id,
                payment_reference: booking.payment_reference.clone().unwrap_or_default(),
                outcome: booking.payment_status.as_str().to_string(),
                amount: booking.refund_amount.unwrap_or(booking.total_price),
                timestamp: Utc::now().timestamp(),
            })
            .await;
    }

    Ok(ok_message(booking, "Booking refunded"))
}

/// POST /v1/payments/webhook
/// Raw body on purpose: the signature covers the exact bytes sent by the
/// provider. Unverifiable payloads are rejected before any parsing.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::ValidationError("Missing signature header".to_string()))?;

    let event = state
        .gateway
        .verify_webhook_signature(&body, signature)
        .map_err(|e| {
            tracing::warn!("Webhook rejected: {}", e);
            AppError::ValidationError("Webhook signature verification failed".to_string())
        })?;

    tracing::info!(
        "Received webhook {} for intent {}",
        event.event_type,
        event.data.object.id
    );

    state.reconciler.handle_webhook_event(&event).await?;

    Ok(ok(serde_json::json!({"received": true})))
}
