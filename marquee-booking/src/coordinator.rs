use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use marquee_catalog::movies::MovieCatalog;
use marquee_catalog::seating::SeatTier;
use marquee_catalog::show::{Show, ShowRepository};
use marquee_core::payment::{PaymentGateway, PaymentIntent};
use marquee_core::{CoreError, CoreResult};

use crate::models::{refund_amount, Booking, BookingStatus, MovieSnapshot, PaymentState};
use crate::repository::BookingRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: String,
    pub movie_id: String,
    pub show_id: Uuid,
    pub seats: Vec<String>,
    pub seat_types: Option<Vec<SeatTier>>,
    pub total_price: f64,
    pub special_requests: Option<String>,
    // Denormalized display copies sent by some clients; the show record is
    // authoritative, so these are accepted and ignored.
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub refund_percent: u32,
    pub payment_timeout: Duration,
    pub currency: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            refund_percent: 80,
            payment_timeout: Duration::from_secs(10),
            currency: "USD".to_string(),
        }
    }
}

/// Enforces atomicity between booking creation/cancellation and seat
/// inventory mutation. All seat claims and releases pass through here or
/// through the payment reconciler.
pub struct ReservationCoordinator {
    shows: Arc<dyn ShowRepository>,
    bookings: Arc<dyn BookingRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<dyn MovieCatalog>,
    config: CoordinatorConfig,
}

impl ReservationCoordinator {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<dyn MovieCatalog>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            shows,
            bookings,
            gateway,
            catalog,
            config,
        }
    }

    pub fn refund_percent(&self) -> u32 {
        self.config.refund_percent
    }

    fn validate(req: &CreateBookingRequest) -> CoreResult<()> {
        if req.user_id.trim().is_empty() {
            return Err(CoreError::InvalidArgument("Missing user id".to_string()));
        }
        if req.movie_id.trim().is_empty() {
            return Err(CoreError::InvalidArgument("Missing movie id".to_string()));
        }
        if req.seats.is_empty() {
            return Err(CoreError::InvalidArgument(
                "At least one seat is required".to_string(),
            ));
        }
        if req.total_price < 0.0 || !req.total_price.is_finite() {
            return Err(CoreError::InvalidArgument(
                "Total price must be a non-negative amount".to_string(),
            ));
        }
        if let Some(types) = &req.seat_types {
            if types.len() != req.seats.len() {
                return Err(CoreError::InvalidArgument(
                    "seat_types must match seats one-to-one".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn load_show(&self, show_id: Uuid) -> CoreResult<Show> {
        self.shows
            .get_show(show_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", show_id)))
    }

    /// Value-copy denormalization: the booking keeps its own snapshot of
    /// show/theater/movie display data taken now, never a live reference.
    async fn build_booking(&self, req: &CreateBookingRequest, show: &Show) -> Booking {
        let movie = match self.catalog.get_movie(&req.movie_id).await {
            Ok(Some(details)) => MovieSnapshot {
                title: details.title,
                poster_url: details.poster_url,
                duration_minutes: details.duration_minutes,
            },
            Ok(None) | Err(_) => MovieSnapshot {
                title: req.movie_id.clone(),
                poster_url: None,
                duration_minutes: 0,
            },
        };

        let seat_types = req.seat_types.clone().unwrap_or_else(|| {
            req.seats
                .iter()
                .map(|s| show.layout.tier_for_seat(s).unwrap_or(SeatTier::Standard))
                .collect()
        });

        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: req.user_id.clone(),
            movie_id: req.movie_id.clone(),
            show_id: show.id,
            seats: req.seats.clone(),
            seat_types,
            total_price: req.total_price,
            payment_status: PaymentState::Pending,
            booking_status: BookingStatus::Pending,
            payment_reference: None,
            show_date: show.show_date,
            show_time: show.show_time.clone(),
            theater: show.theater.clone(),
            movie,
            special_requests: req.special_requests.clone(),
            cancellation_date: None,
            refund_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flow A: direct booking with the seats claimed immediately. The
    /// booking row and the inventory mutation succeed or fail together; a
    /// claim failure rolls the freshly created booking back.
    pub async fn create_booking(&self, req: &CreateBookingRequest) -> CoreResult<Booking> {
        Self::validate(req)?;

        let show = self.load_show(req.show_id).await?;
        show.check_claim(&req.seats)?;

        let booking = self.build_booking(req, &show).await;
        self.bookings.create_booking(&booking).await?;

        match self.shows.claim_seats(show.id, &req.seats).await {
            Ok(_) => {
                tracing::info!(
                    booking_id = %booking.id,
                    show_id = %show.id,
                    seats = ?req.seats,
                    "Seats claimed for booking"
                );
                Ok(booking)
            }
            Err(e) => {
                // Lost the race after the precheck; the ledger row must not
                // survive with inventory untouched.
                if let Err(del) = self.bookings.delete_booking(booking.id).await {
                    tracing::error!(booking_id = %booking.id, error = %del, "Rollback of failed booking did not complete");
                }
                Err(e)
            }
        }
    }

    /// Flow B: payment-gated booking. The external intent is created first;
    /// the booking stores its reference but the seats stay unclaimed until
    /// the payment reconciler sees a success event.
    pub async fn create_payment_gated_booking(
        &self,
        req: &CreateBookingRequest,
    ) -> CoreResult<(Booking, PaymentIntent)> {
        Self::validate(req)?;

        let show = self.load_show(req.show_id).await?;
        show.check_claim(&req.seats)?;

        let amount_minor = (req.total_price * 100.0).round() as i64;
        let metadata = serde_json::json!({
            "user_id": req.user_id,
            "movie_id": req.movie_id,
            "show_id": req.show_id,
            "seats": req.seats,
        });

        let intent = tokio::time::timeout(
            self.config.payment_timeout,
            self.gateway
                .create_intent(amount_minor, &self.config.currency, metadata),
        )
        .await
        .map_err(|_| CoreError::Upstream("Payment intent creation timed out".to_string()))??;

        let mut booking = self.build_booking(req, &show).await;
        booking.payment_reference = Some(intent.id.clone());

        if let Err(e) = self.bookings.create_booking(&booking).await {
            // Booking and intent are created together or not at all
            let _ = self.gateway.cancel_intent(&intent.id).await;
            return Err(e);
        }

        tracing::info!(
            booking_id = %booking.id,
            intent_id = %intent.id,
            "Payment-gated booking created, seats unclaimed until confirmation"
        );
        Ok((booking, intent))
    }

    /// Cancel a confirmed booking: 80/20 refund split (percentage from
    /// business rules) and idempotent seat release.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;

        if !booking.can_cancel(Utc::now()) {
            return Err(CoreError::InvalidState(
                "Only confirmed bookings with an upcoming show can be cancelled".to_string(),
            ));
        }

        let refund = refund_amount(booking.total_price, self.config.refund_percent);
        booking.mark_cancelled(refund);
        self.bookings.update_booking(&booking).await?;

        release_seats_with_retry(self.shows.as_ref(), booking.show_id, &booking.seats).await;

        tracing::info!(
            booking_id = %booking.id,
            refund,
            "Booking cancelled, seats released"
        );
        Ok(booking)
    }
}

/// Seats left claimed by a cancelled booking are a resource leak, so the
/// release is retried on transient storage failure instead of giving up.
pub(crate) async fn release_seats_with_retry(
    shows: &dyn ShowRepository,
    show_id: Uuid,
    seats: &[String],
) {
    let mut delay = Duration::from_millis(50);
    for attempt in 1..=3 {
        match shows.release_seats(show_id, seats).await {
            Ok(_) => return,
            Err(CoreError::NotFound(_)) => {
                // Show gone; nothing left to release
                return;
            }
            Err(e) if attempt < 3 => {
                tracing::warn!(show_id = %show_id, attempt, error = %e, "Seat release failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::error!(show_id = %show_id, seats = ?seats, error = %e, "Seat release failed after retries; seats remain claimed");
            }
        }
    }
}
