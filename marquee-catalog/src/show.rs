use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::{CoreError, CoreResult};

use crate::pricing::PricingTiers;
use crate::seating::{build_seat_grid, SeatGridEntry, SeatLayout};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShowStatus {
    Active,
    Cancelled,
    Completed,
}

impl ShowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowStatus::Active => "ACTIVE",
            ShowStatus::Cancelled => "CANCELLED",
            ShowStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ShowStatus::Active),
            "CANCELLED" => Some(ShowStatus::Cancelled),
            "COMPLETED" => Some(ShowStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TheaterInfo {
    pub name: String,
    pub location: String,
    pub city: String,
}

/// One scheduled screening. The show owns its seat inventory exclusively;
/// `booked_seats`/`available_seats` only change through claim/release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: Uuid,
    pub movie_id: String,
    pub theater: TheaterInfo,
    pub show_date: NaiveDate,
    pub show_time: String,
    pub language: String,
    pub format: String, // 2D / 3D / IMAX
    pub layout: SeatLayout,
    pub total_seats: i32,
    pub available_seats: i32,
    pub booked_seats: Vec<String>,
    pub pricing: PricingTiers,
    pub status: ShowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Show {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        movie_id: String,
        theater: TheaterInfo,
        show_date: NaiveDate,
        show_time: String,
        language: String,
        format: String,
        layout: SeatLayout,
        pricing: PricingTiers,
    ) -> Self {
        let now = Utc::now();
        let total = layout.total_seats();
        Self {
            id: Uuid::new_v4(),
            movie_id,
            theater,
            show_date,
            show_time,
            language,
            format,
            layout,
            total_seats: total,
            available_seats: total,
            booked_seats: Vec::new(),
            pricing,
            status: ShowStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Show start as a UTC instant. An unparseable time string falls back to
    /// midnight so date comparisons still work.
    pub fn start_at(&self) -> DateTime<Utc> {
        let time = NaiveTime::parse_from_str(&self.show_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        self.show_date.and_time(time).and_utc()
    }

    /// Validate a claim without mutating: layout membership, conflicts with
    /// the booked set, and remaining availability.
    pub fn check_claim(&self, seats: &[String]) -> CoreResult<()> {
        if seats.is_empty() {
            return Err(CoreError::InvalidArgument(
                "No seats requested".to_string(),
            ));
        }
        for (i, seat) in seats.iter().enumerate() {
            if !self.layout.contains(seat) {
                return Err(CoreError::InvalidArgument(format!(
                    "Seat {} is not part of this auditorium",
                    seat
                )));
            }
            if seats[..i].contains(seat) {
                return Err(CoreError::InvalidArgument(format!(
                    "Seat {} requested twice",
                    seat
                )));
            }
        }

        let conflicts: Vec<String> = seats
            .iter()
            .filter(|s| self.booked_seats.contains(s))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Err(CoreError::SeatConflict { seats: conflicts });
        }

        if self.available_seats < seats.len() as i32 {
            return Err(CoreError::InsufficientAvailability {
                requested: seats.len() as i32,
                available: self.available_seats,
            });
        }
        Ok(())
    }

    /// Apply a validated claim. Callers must hold whatever lock makes the
    /// check+apply pair atomic for their storage.
    pub fn apply_claim(&mut self, seats: &[String]) {
        self.booked_seats.extend(seats.iter().cloned());
        self.available_seats = self.total_seats - self.booked_seats.len() as i32;
        self.updated_at = Utc::now();
    }

    /// Remove seats from the booked set, ignoring any not present.
    pub fn apply_release(&mut self, seats: &[String]) {
        self.booked_seats.retain(|s| !seats.contains(s));
        self.available_seats = self.total_seats - self.booked_seats.len() as i32;
        self.updated_at = Utc::now();
    }

    pub fn seat_availability(&self) -> SeatAvailability {
        SeatAvailability {
            show_id: self.id,
            total: self.total_seats,
            available: self.available_seats,
            booked: self.booked_seats.clone(),
            seats: build_seat_grid(&self.layout, &self.booked_seats),
            pricing: self.pricing.clone(),
        }
    }
}

/// Projection returned by the seat-availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub show_id: Uuid,
    pub total: i32,
    pub available: i32,
    pub booked: Vec<String>,
    pub seats: Vec<SeatGridEntry>,
    pub pricing: PricingTiers,
}

/// Admin edit payload. Seat inventory is deliberately absent: the edit path
/// never mutates `booked_seats`/`total_seats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowUpdate {
    pub show_date: Option<NaiveDate>,
    pub show_time: Option<String>,
    pub language: Option<String>,
    pub format: Option<String>,
    pub pricing: Option<PricingTiers>,
    pub status: Option<ShowStatus>,
}

/// Repository trait for show/inventory access. Implementations must make
/// `claim_seats` safe under concurrent callers for the same show: the
/// conflict check and the mutation happen as one atomic storage operation.
#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn create_show(&self, show: &Show) -> CoreResult<Uuid>;

    async fn get_show(&self, id: Uuid) -> CoreResult<Option<Show>>;

    async fn list_shows(&self) -> CoreResult<Vec<Show>>;

    async fn update_show(&self, id: Uuid, update: &ShowUpdate) -> CoreResult<Show>;

    async fn delete_show(&self, id: Uuid) -> CoreResult<()>;

    /// Atomically claim seats: fails with `SeatConflict` naming the
    /// overlapping seats, or `InsufficientAvailability`. First claimant
    /// wins; later claimants for a contested seat get the conflict.
    async fn claim_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show>;

    /// Idempotently release seats back to the inventory.
    async fn release_seats(&self, id: Uuid, seats: &[String]) -> CoreResult<Show>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show() -> Show {
        Show::new(
            "mv-100".to_string(),
            TheaterInfo {
                name: "Grand Screen 1".to_string(),
                location: "Downtown".to_string(),
                city: "Springfield".to_string(),
            },
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            "19:30".to_string(),
            "English".to_string(),
            "2D".to_string(),
            SeatLayout::new(
                vec!["A", "B"].into_iter().map(String::from).collect(),
                5,
            ),
            PricingTiers {
                standard: 10.0,
                premium: 15.0,
                vip: 25.0,
            },
        )
    }

    #[test]
    fn test_inventory_invariant_after_claim_and_release() {
        let mut show = show();
        assert_eq!(show.total_seats, 10);
        assert_eq!(show.available_seats, 10);

        let seats = vec!["A1".to_string(), "A2".to_string()];
        show.check_claim(&seats).unwrap();
        show.apply_claim(&seats);
        assert_eq!(show.available_seats, 8);
        assert_eq!(
            show.available_seats,
            show.total_seats - show.booked_seats.len() as i32
        );

        show.apply_release(&seats);
        assert_eq!(show.available_seats, 10);
        assert!(show.booked_seats.is_empty());

        // Releasing again changes nothing
        show.apply_release(&seats);
        assert_eq!(show.available_seats, 10);
    }

    #[test]
    fn test_claim_conflict_names_contested_seats() {
        let mut show = show();
        show.apply_claim(&["A2".to_string()]);

        let err = show
            .check_claim(&["A2".to_string(), "A3".to_string()])
            .unwrap_err();
        match err {
            CoreError::SeatConflict { seats } => assert_eq!(seats, vec!["A2".to_string()]),
            other => panic!("expected SeatConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_claim_rejects_unknown_and_duplicate_seats() {
        let show = show();
        assert!(matches!(
            show.check_claim(&["Z9".to_string()]),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            show.check_claim(&["A1".to_string(), "A1".to_string()]),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_insufficient_availability() {
        let mut show = show();
        // Simulate a concurrent writer having claimed ahead of this check
        show.available_seats = 1;

        let err = show
            .check_claim(&["A1".to_string(), "A2".to_string()])
            .unwrap_err();
        match err {
            CoreError::InsufficientAvailability {
                requested,
                available,
            } => {
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
