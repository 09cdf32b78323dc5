use std::sync::Arc;
use uuid::Uuid;

use marquee_catalog::show::ShowRepository;
use marquee_core::payment::{PaymentGateway, PaymentIntentStatus, WebhookEvent};
use marquee_core::{CoreError, CoreResult};

use crate::coordinator::release_seats_with_retry;
use crate::models::{Booking, BookingStatus, PaymentState};
use crate::repository::BookingRepository;

/// Translates external payment outcomes into booking/seat state. Both input
/// channels (direct confirmation call, webhook delivery) funnel through the
/// same idempotent transitions, so replays and out-of-order delivery
/// converge on one outcome.
pub struct PaymentReconciler {
    shows: Arc<dyn ShowRepository>,
    bookings: Arc<dyn BookingRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentReconciler {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            shows,
            bookings,
            gateway,
        }
    }

    /// Direct channel: the client reports synchronous payment completion.
    /// The intent is re-fetched from the gateway rather than trusted.
    pub async fn confirm_payment(&self, intent_id: &str, booking_id: Uuid) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;

        if booking.payment_reference.as_deref() != Some(intent_id) {
            return Err(CoreError::InvalidArgument(
                "Payment intent does not belong to this booking".to_string(),
            ));
        }

        let intent = self.gateway.get_intent(intent_id).await?;
        match intent.status {
            PaymentIntentStatus::Succeeded => self.apply_success(booking).await,
            PaymentIntentStatus::Failed | PaymentIntentStatus::Canceled => {
                self.apply_failure(booking).await
            }
            _ => Err(CoreError::InvalidState(
                "Payment has not settled yet".to_string(),
            )),
        }
    }

    /// Webhook channel: authoritative intent lifecycle events, possibly
    /// redelivered. Unknown intents are acknowledged without effect so the
    /// provider stops retrying.
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> CoreResult<()> {
        let intent_id = event.data.object.id.as_str();

        let booking = match self.bookings.find_by_payment_reference(intent_id).await? {
            Some(b) => b,
            None => {
                tracing::warn!(intent_id, event_type = %event.event_type, "Webhook for unknown payment intent, ignoring");
                return Ok(());
            }
        };

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                self.apply_success(booking).await?;
            }
            "payment_intent.payment_failed" | "payment_intent.canceled" => {
                self.apply_failure(booking).await?;
            }
            other => {
                tracing::debug!(event_type = other, "Ignoring unhandled webhook event type");
            }
        }
        Ok(())
    }

    /// Success transition: the actual seat-claim point for payment-gated
    /// bookings. Membership is checked before appending, so replays never
    /// double-claim seats or double-decrement availability.
    async fn apply_success(&self, mut booking: Booking) -> CoreResult<Booking> {
        if booking.booking_status == BookingStatus::Confirmed
            && booking.payment_status == PaymentState::Completed
        {
            // Replay of an already-processed success event
            return Ok(booking);
        }
        if booking.booking_status == BookingStatus::Cancelled {
            return Err(CoreError::InvalidState(
                "Booking was cancelled before payment settled".to_string(),
            ));
        }

        let show = self
            .shows
            .get_show(booking.show_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", booking.show_id)))?;

        let missing: Vec<String> = booking
            .seats
            .iter()
            .filter(|s| !show.booked_seats.contains(s))
            .cloned()
            .collect();

        if !missing.is_empty() {
            self.shows.claim_seats(booking.show_id, &missing).await?;
        }

        booking.mark_confirmed();
        self.bookings.update_booking(&booking).await?;

        tracing::info!(booking_id = %booking.id, "Payment succeeded, booking confirmed");
        Ok(booking)
    }

    async fn apply_failure(&self, mut booking: Booking) -> CoreResult<Booking> {
        if booking.payment_status == PaymentState::Failed {
            return Ok(booking);
        }

        // Payment-gated bookings never claimed their seats, so there is
        // nothing to release here.
        booking.mark_payment_failed();
        self.bookings.update_booking(&booking).await?;

        tracing::info!(booking_id = %booking.id, "Payment failed, booking cancelled");
        Ok(booking)
    }

    /// Explicit user cancel of an in-flight payment. The booking never
    /// became real, so the row is hard-deleted rather than soft-cancelled.
    pub async fn cancel_before_payment(&self, booking_id: Uuid) -> CoreResult<()> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;

        if booking.booking_status != BookingStatus::Pending {
            return Err(CoreError::InvalidState(
                "Only pending bookings can be abandoned".to_string(),
            ));
        }

        if let Some(reference) = &booking.payment_reference {
            match self.gateway.get_intent(reference).await {
                Ok(intent)
                    if intent.status != PaymentIntentStatus::Succeeded
                        && intent.status != PaymentIntentStatus::Canceled =>
                {
                    if let Err(e) = self.gateway.cancel_intent(reference).await {
                        tracing::warn!(intent_id = %reference, error = %e, "Intent cancellation failed, deleting booking anyway");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(intent_id = %reference, error = %e, "Could not fetch intent during cancel");
                }
            }
        }

        self.bookings.delete_booking(booking_id).await?;
        tracing::info!(booking_id = %booking_id, "Pending booking deleted before payment");
        Ok(())
    }

    /// Post-confirmation refund (admin or user initiated): full external
    /// refund, booking moves to cancelled/refunded, seats released.
    pub async fn refund_booking(
        &self,
        booking_id: Uuid,
        reason: Option<&str>,
    ) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;

        if booking.payment_status != PaymentState::Completed {
            return Err(CoreError::InvalidState(
                "Only completed payments can be refunded".to_string(),
            ));
        }

        let reference = booking.payment_reference.clone().ok_or_else(|| {
            CoreError::InvalidState("Booking has no payment reference".to_string())
        })?;

        let refund_id = self.gateway.refund(&reference, reason).await?;

        booking.mark_cancelled(booking.total_price);
        self.bookings.update_booking(&booking).await?;

        release_seats_with_retry(self.shows.as_ref(), booking.show_id, &booking.seats).await;

        tracing::info!(booking_id = %booking.id, refund_id = %refund_id, "Booking refunded in full");
        Ok(booking)
    }
}
