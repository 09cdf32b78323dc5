use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_catalog::seating::SeatTier;
use marquee_catalog::show::TheaterInfo;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "COMPLETED" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

/// Payment status as tracked on the booking row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "PENDING",
            PaymentState::Completed => "COMPLETED",
            PaymentState::Failed => "FAILED",
            PaymentState::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentState::Pending),
            "COMPLETED" => Some(PaymentState::Completed),
            "FAILED" => Some(PaymentState::Failed),
            "REFUNDED" => Some(PaymentState::Refunded),
            _ => None,
        }
    }
}

/// Movie details copied onto the booking at creation time, so past bookings
/// render correctly even after the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSnapshot {
    pub title: String,
    pub poster_url: Option<String>,
    pub duration_minutes: i32,
}

/// One reservation attempt/outcome. Owns its lifecycle fields; reads but
/// never owns show state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub movie_id: String,
    pub show_id: Uuid,
    pub seats: Vec<String>,
    pub seat_types: Vec<SeatTier>,
    pub total_price: f64,
    pub payment_status: PaymentState,
    pub booking_status: BookingStatus,
    pub payment_reference: Option<String>,
    pub show_date: NaiveDate,
    pub show_time: String,
    pub theater: TheaterInfo,
    pub movie: MovieSnapshot,
    pub special_requests: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub refund_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Show start as a UTC instant, from the denormalized date/time copy.
    pub fn show_start(&self) -> DateTime<Utc> {
        let time = NaiveTime::parse_from_str(&self.show_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        self.show_date.and_time(time).and_utc()
    }

    pub fn days_until_show(&self, now: DateTime<Utc>) -> i64 {
        let seconds = (self.show_start() - now).num_seconds();
        (seconds as f64 / 86_400.0).ceil() as i64
    }

    /// Only confirmed bookings with the show still ahead can be cancelled.
    /// The legacy predicate also accepted already-cancelled bookings, which
    /// would double-apply the refund; the strict check is intentional.
    pub fn can_cancel(&self, now: DateTime<Utc>) -> bool {
        self.booking_status == BookingStatus::Confirmed && self.show_start() > now
    }

    pub fn mark_confirmed(&mut self) {
        self.payment_status = PaymentState::Completed;
        self.booking_status = BookingStatus::Confirmed;
        self.updated_at = Utc::now();
    }

    pub fn mark_payment_failed(&mut self) {
        self.payment_status = PaymentState::Failed;
        self.booking_status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    pub fn mark_cancelled(&mut self, refund_amount: f64) {
        let now = Utc::now();
        self.booking_status = BookingStatus::Cancelled;
        self.payment_status = PaymentState::Refunded;
        self.cancellation_date = Some(now);
        self.refund_amount = Some(refund_amount);
        self.updated_at = now;
    }

    pub fn summary(&self, now: DateTime<Utc>) -> BookingSummary {
        BookingSummary {
            booking_id: self.id,
            movie: self.movie.clone(),
            theater: self.theater.clone(),
            show_date: self.show_date,
            show_time: self.show_time.clone(),
            seats: self.seats.clone(),
            seat_types: self.seat_types.clone(),
            total_price: self.total_price,
            payment_status: self.payment_status,
            booking_status: self.booking_status,
            days_until_show: self.days_until_show(now),
            can_cancel: self.can_cancel(now),
            created_at: self.created_at,
        }
    }
}

/// Display projection with derived fields, for booking lists and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub movie: MovieSnapshot,
    pub theater: TheaterInfo,
    pub show_date: NaiveDate,
    pub show_time: String,
    pub seats: Vec<String>,
    pub seat_types: Vec<SeatTier>,
    pub total_price: f64,
    pub payment_status: PaymentState,
    pub booking_status: BookingStatus,
    pub days_until_show: i64,
    pub can_cancel: bool,
    pub created_at: DateTime<Utc>,
}

/// Refund arithmetic in minor units so percentages come out exact.
pub fn refund_amount(total_price: f64, percent: u32) -> f64 {
    let cents = (total_price * 100.0).round() as i64;
    let refund_cents = cents * percent as i64 / 100;
    refund_cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn booking(status: BookingStatus, start_in: Duration) -> Booking {
        let start = Utc::now() + start_in;
        Booking {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            movie_id: "mv-1".to_string(),
            show_id: Uuid::new_v4(),
            seats: vec!["A1".to_string()],
            seat_types: vec![SeatTier::Standard],
            total_price: 100.0,
            payment_status: PaymentState::Completed,
            booking_status: status,
            payment_reference: None,
            show_date: start.date_naive(),
            show_time: start.format("%H:%M").to_string(),
            theater: TheaterInfo {
                name: "Screen 1".to_string(),
                location: "Main St".to_string(),
                city: "Springfield".to_string(),
            },
            movie: MovieSnapshot {
                title: "Example".to_string(),
                poster_url: None,
                duration_minutes: 120,
            },
            special_requests: None,
            cancellation_date: None,
            refund_amount: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_refund_arithmetic_is_exact() {
        assert_eq!(refund_amount(100.0, 80), 80.0);
        assert_eq!(refund_amount(50.0, 80), 40.0);
        assert_eq!(refund_amount(33.35, 80), 26.68);
        assert_eq!(refund_amount(0.0, 80), 0.0);
    }

    #[test]
    fn test_can_cancel_requires_confirmed() {
        let confirmed = booking(BookingStatus::Confirmed, Duration::days(3));
        assert!(confirmed.can_cancel(Utc::now()));

        // Cancelled bookings are not cancellable again
        let cancelled = booking(BookingStatus::Cancelled, Duration::days(3));
        assert!(!cancelled.can_cancel(Utc::now()));

        let pending = booking(BookingStatus::Pending, Duration::days(3));
        assert!(!pending.can_cancel(Utc::now()));

        let past = booking(BookingStatus::Confirmed, Duration::days(-1));
        assert!(!past.can_cancel(Utc::now()));
    }

    #[test]
    fn test_days_until_show_rounds_up() {
        let b = booking(BookingStatus::Confirmed, Duration::hours(30));
        assert_eq!(b.days_until_show(Utc::now()), 2);

        let soon = booking(BookingStatus::Confirmed, Duration::hours(2));
        assert_eq!(soon.days_until_show(Utc::now()), 1);
    }

    #[test]
    fn test_mark_cancelled_sets_refund_fields() {
        let mut b = booking(BookingStatus::Confirmed, Duration::days(3));
        b.mark_cancelled(refund_amount(b.total_price, 80));

        assert_eq!(b.booking_status, BookingStatus::Cancelled);
        assert_eq!(b.payment_status, PaymentState::Refunded);
        assert_eq!(b.refund_amount, Some(80.0));
        assert!(b.cancellation_date.is_some());
    }
}
