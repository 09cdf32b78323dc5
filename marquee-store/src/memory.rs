//! In-memory repositories. Used by tests and as a stand-in store when no
//! database is configured. Each repository holds its map behind a single
//! async mutex, so a seat claim's check-then-apply runs without interleaving.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use marquee_booking::models::{Booking, BookingStatus, PaymentState};
use marquee_booking::repository::BookingRepository;
use marquee_catalog::movies::{Favorite, FavoriteRepository};
use marquee_catalog::show::{Show, ShowRepository, ShowUpdate};
use marquee_core::{CoreError, CoreResult};

#[derive(Default)]
pub struct MemoryShowRepository {
    shows: Arc<Mutex<HashMap<Uuid, Show>>>,
}

impl MemoryShowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShowRepository for MemoryShowRepository {
    async fn create_show(&self, show: &Show) -> CoreResult<Uuid> {
        let mut shows = self.shows.lock().await;
        shows.insert(show.id, show.clone());
        Ok(show.id)
    }

    async fn get_show(&self, id: Uuid) -> CoreResult<Option<Show>> {
        let shows = self.shows.lock().await;
        Ok(shows.get(&id).cloned())
    }

    async fn list_shows(&self) -> CoreResult<Vec<Show>> {
        let shows = self.shows.lock().await;
        let mut all: Vec<Show> = shows.values().cloned().collect();
        all.sort_by(|a, b| (a.show_date, &a.show_time).cmp(&(b.show_date, &b.show_time)));
        Ok(all)
    }

    async fn update_show(&self, id: Uuid, update: &ShowUpdate) -> CoreResult<Show> {
        let mut shows = self.shows.lock().await;
        let show = shows
            .get_mut(&id)
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
        Ok(show.clone())
    }

    async fn delete_show(&self, id: Uuid) -> CoreResult<()> {
        let mut shows = self.shows.lock().await;
        shows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))
    }

    async fn claim_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show> {
        // The lock spans the check and the apply, which is what makes the
        // claim atomic here.
        let mut shows = self.shows.lock().await;
        let show = shows
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))?;
        show.check_claim(seats)?;
        show.apply_claim(seats);
        Ok(show.clone())
    }

    async fn release_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show> {
        let mut shows = self.shows.lock().await;
        let show = shows
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("Show {}", id)))?;
        show.apply_release(seats);
        Ok(show.clone())
    }
}

#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: Arc<Mutex<HashMap<Uuid, Booking>>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> CoreResult<Uuid> {
        let mut bookings = self.bookings.lock().await;
        bookings.insert(booking.id, booking.clone());
        Ok(booking.id)
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn update_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let stored = bookings
            .get_mut(&booking.id)
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking.id)))?;
        *stored = booking.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_booking(&self, id: Uuid) -> CoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        bookings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))
    }

    async fn list_user_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_active_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let now = Utc::now();
        let bookings = self.bookings.lock().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| {
                b.user_id == user_id
                    && b.booking_status == BookingStatus::Confirmed
                    && b.show_start() > now
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.show_start().cmp(&b.show_start()));
        Ok(result)
    }

    async fn list_past_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        let now = Utc::now();
        let bookings = self.bookings.lock().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id && b.show_start() <= now)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.show_start().cmp(&a.show_start()));
        Ok(result)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentState,
        payment_reference: Option<&str>,
    ) -> CoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))?;
        booking.payment_status = status;
        if let Some(reference) = payment_reference {
            booking.payment_reference = Some(reference.to_string());
        }
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn update_special_requests(&self, id: Uuid, notes: Option<&str>) -> CoreResult<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))?;
        booking.special_requests = notes.map(str::to_string);
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn find_by_payment_reference(&self, reference: &str) -> CoreResult<Option<Booking>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .values()
            .find(|b| b.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn bookings_exist_for_show(&self, show_id: Uuid) -> CoreResult<bool> {
        // Cancelled bookings still reference the show, so they block deletion too.
        let bookings = self.bookings.lock().await;
        Ok(bookings.values().any(|b| b.show_id == show_id))
    }
}

#[derive(Default)]
pub struct MemoryFavoriteRepository {
    favorites: Arc<Mutex<Vec<Favorite>>>,
}

impl MemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteRepository for MemoryFavoriteRepository {
    async fn add_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<Favorite> {
        let mut favorites = self.favorites.lock().await;
        if favorites
            .iter()
            .any(|f| f.user_id == user_id && f.movie_id == movie_id)
        {
            return Err(CoreError::Conflict(format!(
                "Movie {} is already a favorite",
                movie_id
            )));
        }
        let favorite = Favorite {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            created_at: Utc::now(),
        };
        favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<()> {
        let mut favorites = self.favorites.lock().await;
        let before = favorites.len();
        favorites.retain(|f| !(f.user_id == user_id && f.movie_id == movie_id));
        if favorites.len() == before {
            return Err(CoreError::NotFound(format!("Favorite {}", movie_id)));
        }
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> CoreResult<Vec<Favorite>> {
        let favorites = self.favorites.lock().await;
        let mut result: Vec<Favorite> = favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use marquee_booking::models::MovieSnapshot;
    use marquee_catalog::pricing::PricingTiers;
    use marquee_catalog::seating::{SeatLayout, SeatTier};
    use marquee_catalog::show::TheaterInfo;

    fn sample_show() -> Show {
        Show::new(
            "movie-1".to_string(),
            TheaterInfo {
                name: "Grand Cinema".to_string(),
                location: "Downtown".to_string(),
                city: "Springfield".to_string(),
            },
            NaiveDate::from_ymd_opt(2027, 3, 14).unwrap(),
            "19:30".to_string(),
            "English".to_string(),
            "IMAX".to_string(),
            SeatLayout::new(
                vec!["A", "B", "C", "D"].into_iter().map(String::from).collect(),
                10,
            ),
            PricingTiers {
                standard: 10.0,
                premium: 15.0,
                vip: 25.0,
            },
        )
    }

    #[tokio::test]
    async fn claim_updates_availability() {
        let repo = MemoryShowRepository::new();
        let show = sample_show();
        let id = repo.create_show(&show).await.unwrap();

        let seats = vec!["A1".to_string(), "A2".to_string()];
        let updated = repo.claim_seats(id, &seats).await.unwrap();
        assert_eq!(updated.available_seats, updated.total_seats - 2);
        assert!(updated.booked_seats.contains(&"A1".to_string()));
    }

    #[tokio::test]
    async fn overlapping_claims_have_one_winner() {
        let repo = Arc::new(MemoryShowRepository::new());
        let show = sample_show();
        let id = repo.create_show(&show).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let seats = vec!["B5".to_string(), "B6".to_string()];
                repo.claim_seats(id, &seats).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let show = repo.get_show(id).await.unwrap().unwrap();
        assert_eq!(show.booked_seats.len(), 2);
        assert_eq!(show.available_seats, show.total_seats - 2);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let repo = MemoryShowRepository::new();
        let show = sample_show();
        let id = repo.create_show(&show).await.unwrap();

        let seats = vec!["C1".to_string()];
        repo.claim_seats(id, &seats).await.unwrap();
        let released = repo.release_seats(id, &seats).await.unwrap();
        assert_eq!(released.available_seats, released.total_seats);

        // Releasing a seat nobody holds changes nothing.
        let again = repo.release_seats(id, &seats).await.unwrap();
        assert_eq!(again.available_seats, again.total_seats);
    }

    fn sample_booking(show_id: Uuid, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            movie_id: "movie-1".to_string(),
            show_id,
            seats: vec!["A1".to_string()],
            seat_types: vec![SeatTier::Standard],
            total_price: 10.0,
            payment_status: PaymentState::Completed,
            booking_status: status,
            payment_reference: None,
            show_date: NaiveDate::from_ymd_opt(2027, 3, 14).unwrap(),
            show_time: "19:30".to_string(),
            theater: TheaterInfo {
                name: "Grand Cinema".to_string(),
                location: "Downtown".to_string(),
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

    #[tokio::test]
    async fn cancelled_bookings_still_block_show_deletion() {
        let shows = MemoryShowRepository::new();
        let bookings = MemoryBookingRepository::new();
        let show_id = shows.create_show(&sample_show()).await.unwrap();

        let mut booking = sample_booking(show_id, BookingStatus::Confirmed);
        booking.mark_cancelled(8.0);
        bookings.create_booking(&booking).await.unwrap();

        assert!(bookings.bookings_exist_for_show(show_id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_favorite_rejected() {
        let repo = MemoryFavoriteRepository::new();
        repo.add_favorite("user-1", "movie-9").await.unwrap();
        let err = repo.add_favorite("user-1", "movie-9").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
