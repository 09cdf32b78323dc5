use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_booking::models::{Booking, BookingStatus, MovieSnapshot, PaymentState};
use marquee_booking::repository::BookingRepository;
use marquee_catalog::seating::SeatTier;
use marquee_catalog::show::TheaterInfo;
use marquee_core::{CoreError, CoreResult};

use crate::show_repo::db_err;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    movie_id: String,
    show_id: Uuid,
    seats: Vec<String>,
    seat_types: Vec<String>,
    total_price: f64,
    booking_status: String,
    payment_status: String,
    payment_reference: Option<String>,
    show_date: NaiveDate,
    show_time: String,
    theater_name: String,
    theater_location: String,
    theater_city: String,
    movie_title: String,
    movie_poster_url: Option<String>,
    movie_duration_minutes: i32,
    special_requests: Option<String>,
    cancellation_date: Option<DateTime<Utc>>,
    refund_amount: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const BOOKING_COLUMNS: &str = "id, user_id, movie_id, show_id, seats, seat_types, total_price, booking_status, payment_status, payment_reference, show_date, show_time, theater_name, theater_location, theater_city, movie_title, movie_poster_url, movie_duration_minutes, special_requests, cancellation_date, refund_amount, created_at, updated_at";

impl BookingRow {
    fn into_booking(self) -> CoreResult<Booking> {
        let status = BookingStatus::parse(&self.booking_status).ok_or_else(|| {
            CoreError::Internal(format!("Unknown booking status {}", self.booking_status))
        })?;
        let payment_status = PaymentState::parse(&self.payment_status).ok_or_else(|| {
            CoreError::Internal(format!("Unknown payment status {}", self.payment_status))
        })?;
        let seat_types = self
            .seat_types
            .iter()
            .map(|t| {
                SeatTier::parse(t)
                    .ok_or_else(|| CoreError::Internal(format!("Unknown seat tier {}", t)))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            movie_id: self.movie_id,
            show_id: self.show_id,
            seats: self.seats,
            seat_types,
            total_price: self.total_price,
            booking_status: status,
            payment_status,
            payment_reference: self.payment_reference,
            show_date: self.show_date,
            show_time: self.show_time,
            theater: TheaterInfo {
                name: self.theater_name,
                location: self.theater_location,
                city: self.theater_city,
            },
            movie: MovieSnapshot {
                title: self.movie_title,
                poster_url: self.movie_poster_url,
                duration_minutes: self.movie_duration_minutes,
            },
            special_requests: self.special_requests,
            cancellation_date: self.cancellation_date,
            refund_amount: self.refund_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn tier_strings(booking: &Booking) -> Vec<String> {
    booking
        .seat_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> CoreResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, movie_id, show_id, seats, seat_types, total_price,
                                  booking_status, payment_status, payment_reference,
                                  show_date, show_time, theater_name, theater_location, theater_city,
                                  movie_title, movie_poster_url, movie_duration_minutes,
                                  special_requests, cancellation_date, refund_amount,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(&booking.movie_id)
        .bind(booking.show_id)
        .bind(&booking.seats)
        .bind(tier_strings(booking))
        .bind(booking.total_price)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_reference)
        .bind(booking.show_date)
        .bind(&booking.show_time)
        .bind(&booking.theater.name)
        .bind(&booking.theater.location)
        .bind(&booking.theater.city)
        .bind(&booking.movie.title)
        .bind(&booking.movie.poster_url)
        .bind(booking.movie.duration_minutes)
        .bind(&booking.special_requests)
        .bind(booking.cancellation_date)
        .bind(booking.refund_amount)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(booking.id)
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn update_booking(&self, booking: &Booking) -> CoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE bookings
            SET booking_status = $2, payment_status = $3, payment_reference = $4,
                special_requests = $5, cancellation_date = $6, refund_amount = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.payment_reference)
        .bind(&booking.special_requests)
        .bind(booking.cancellation_date)
        .bind(booking.refund_amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Booking {}", booking.id)));
        }
        Ok(())
    }

    async fn delete_booking(&self, id: Uuid) -> CoreResult<()> {
        let done = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Booking {}", id)));
        }
        Ok(())
    }

    async fn list_user_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_active_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        // Showtime is a date plus an HH:MM string, so the upcoming cutoff is
        // applied in Rust after a coarse date filter.
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 AND booking_status = 'CONFIRMED' AND show_date >= CURRENT_DATE - 1 ORDER BY show_date, show_time",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let now = Utc::now();
        let mut bookings = rows
            .into_iter()
            .map(BookingRow::into_booking)
            .collect::<CoreResult<Vec<_>>>()?;
        bookings.retain(|b| b.show_start() > now);
        Ok(bookings)
    }

    async fn list_past_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY show_date DESC, show_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let now = Utc::now();
        let mut bookings = rows
            .into_iter()
            .map(BookingRow::into_booking)
            .collect::<CoreResult<Vec<_>>>()?;
        bookings.retain(|b| b.show_start() <= now);
        Ok(bookings)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentState,
        payment_reference: Option<&str>,
    ) -> CoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = $2,
                payment_reference = COALESCE($3, payment_reference),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payment_status.as_str())
        .bind(payment_reference)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Booking {}", id)));
        }
        Ok(())
    }

    async fn update_special_requests(&self, id: Uuid, requests: Option<&str>) -> CoreResult<()> {
        let done = sqlx::query(
            "UPDATE bookings SET special_requests = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(requests)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Booking {}", id)));
        }
        Ok(())
    }

    async fn find_by_payment_reference(&self, reference: &str) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE payment_reference = $1",
            BOOKING_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn bookings_exist_for_show(&self, show_id: Uuid) -> CoreResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE show_id = $1",
        )
        .bind(show_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(count > 0)
    }
}
