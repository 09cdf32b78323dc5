use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_catalog::pricing::PricingTiers;
use marquee_catalog::seating::SeatLayout;
use marquee_catalog::show::{Show, ShowRepository, ShowStatus, ShowUpdate, TheaterInfo};
use marquee_core::{CoreError, CoreResult};

pub struct StoreShowRepository {
    pool: PgPool,
}

impl StoreShowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Database error: {}", e))
}

#[derive(sqlx::FromRow)]
struct ShowRow {
    id: Uuid,
    movie_id: String,
    theater_name: String,
    theater_location: String,
    theater_city: String,
    show_date: NaiveDate,
    show_time: String,
    language: String,
    format: String,
    layout_rows: Vec<String>,
    seats_per_row: i32,
    total_seats: i32,
    available_seats: i32,
    booked_seats: Vec<String>,
    price_standard: f64,
    price_premium: f64,
    price_vip: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SHOW_COLUMNS: &str = "id, movie_id, theater_name, theater_location, theater_city, show_date, show_time, language, format, layout_rows, seats_per_row, total_seats, available_seats, booked_seats, price_standard, price_premium, price_vip, status, created_at, updated_at";

impl ShowRow {
    fn into_show(self) -> CoreResult<Show> {
        let status = ShowStatus::parse(&self.status)
            .ok_or_else(|| CoreError::Internal(format!("Unknown show status {}", self.status)))?;
        Ok(Show {
            id: self.id,
            movie_id: self.movie_id,
            theater: TheaterInfo {
                name: self.theater_name,
                location: self.theater_location,
                city: self.theater_city,
            },
            show_date: self.show_date,
            show_time: self.show_time,
            language: self.language,
            format: self.format,
            layout: SeatLayout {
                rows: self.layout_rows,
                seats_per_row: self.seats_per_row,
            },
            total_seats: self.total_seats,
            available_seats: self.available_seats,
            booked_seats: self.booked_seats,
            pricing: PricingTiers {
                standard: self.price_standard,
                premium: self.price_premium,
                vip: self.price_vip,
            },
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StoreShowRepository {
    async fn fetch_show(&self, id: Uuid) -> CoreResult<Option<Show>> {
        let row = sqlx::query_as::<_, ShowRow>(&format!(
            "SELECT {} FROM shows WHERE id = $1",
            SHOW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(ShowRow::into_show).transpose()
    }
}

#[async_trait]
impl ShowRepository for StoreShowRepository {
    async fn create_show(&self, show: &Show) -> CoreResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO shows (id, movie_id, theater_name, theater_location, theater_city,
                               show_date, show_time, language, format, layout_rows, seats_per_row,
                               total_seats, available_seats, booked_seats,
                               price_standard, price_premium, price_vip, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(show.id)
        .bind(&show.movie_id)
        .bind(&show.theater.name)
        .bind(&show.theater.location)
        .bind(&show.theater.city)
        .bind(show.show_date)
        .bind(&show.show_time)
        .bind(&show.language)
        .bind(&show.format)
        .bind(&show.layout.rows)
        .bind(show.layout.seats_per_row)
        .bind(show.total_seats)
        .bind(show.available_seats)
        .bind(&show.booked_seats)
        .bind(show.pricing.standard)
        .bind(show.pricing.premium)
        .bind(show.pricing.vip)
        .bind(show.status.as_str())
        .bind(show.created_at)
        .bind(show.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(show.id)
    }

    async fn get_show(&self, id: Uuid) -> CoreResult<Option<Show>> {
        self.fetch_show(id).await
    }

    async fn list_shows(&self) -> CoreResult<Vec<Show>> {
        let rows = sqlx::query_as::<_, ShowRow>(&format!(
            "SELECT {} FROM shows ORDER BY show_date, show_time",
            SHOW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ShowRow::into_show).collect()
    }

    async fn update_show(&self, id: Uuid, update: &ShowUpdate) -> CoreResult<Show> {
        // Metadata-only edit: seat inventory columns are never touched here.
        let mut show = self
            .fetch_show(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))?;

        if let Some(date) = update.show_date {
            show.show_date = date;
        }
        if let Some(time) = &update.show_time {
            show.show_time = time.clone();
        }
        if let Some(language) = &update.language {
            show.language = language.clone();
        }
        if let Some(format) = &update.format {
            show.format = format.clone();
        }
        if let Some(pricing) = &update.pricing {
            if !pricing.is_valid() {
                return Err(CoreError::InvalidArgument(
                    "Prices cannot be negative".to_string(),
                ));
            }
            show.pricing = pricing.clone();
        }
        if let Some(status) = update.status {
            show.status = status;
        }
        show.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE shows
            SET show_date = $2, show_time = $3, language = $4, format = $5,
                price_standard = $6, price_premium = $7, price_vip = $8,
                status = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(show.show_date)
        .bind(&show.show_time)
        .bind(&show.language)
        .bind(&show.format)
        .bind(show.pricing.standard)
        .bind(show.pricing.premium)
        .bind(show.pricing.vip)
        .bind(show.status.as_str())
        .bind(show.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(show)
    }

    async fn delete_show(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM shows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(CoreError::NotFound(format!("Show {}", id)))
            }
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db))
                if db.kind() == sqlx::error::ErrorKind::ForeignKeyViolation =>
            {
                Err(CoreError::Conflict(
                    "Show has bookings and cannot be deleted".to_string(),
                ))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn claim_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show> {
        // Optimistic claim: the precheck classifies failures precisely, the
        // conditional UPDATE is the atomic gate. A lost race re-reads and
        // tries again against the fresh booked set.
        for _attempt in 0..3 {
            let show = self
                .fetch_show(id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))?;
            show.check_claim(seats)?;

            let done = sqlx::query(
                r#"
                UPDATE shows
                SET booked_seats = booked_seats || $2,
                    available_seats = available_seats - $3,
                    updated_at = NOW()
                WHERE id = $1
                  AND NOT (booked_seats && $2)
                  AND available_seats >= $3
                "#,
            )
            .bind(id)
            .bind(seats.to_vec())
            .bind(seats.len() as i32)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

            if done.rows_affected() == 1 {
                let mut updated = show;
                updated.apply_claim(seats);
                return Ok(updated);
            }
        }

        Err(CoreError::Conflict(
            "Seat claim lost repeated update races; try again".to_string(),
        ))
    }

    async fn release_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show> {
        let done = sqlx::query(
            r#"
            UPDATE shows
            SET booked_seats = (
                    SELECT COALESCE(array_agg(s), '{}')
                    FROM unnest(booked_seats) AS s
                    WHERE s <> ALL($2)
                ),
                available_seats = total_seats - (
                    SELECT COUNT(*)::int
                    FROM unnest(booked_seats) AS s
                    WHERE s <> ALL($2)
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(seats.to_vec())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Show {}", id)));
        }

        self.fetch_show(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))
    }
}
