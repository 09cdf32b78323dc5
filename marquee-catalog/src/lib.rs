pub mod movies;
pub mod pricing;
pub mod seating;
pub mod show;

pub use movies::{Favorite, FavoriteRepository, MovieCatalog, MovieDetails, StaticMovieCatalog};
pub use pricing::PricingTiers;
pub use seating::{SeatGridEntry, SeatLayout, SeatTier};
pub use show::{SeatAvailability, Show, ShowRepository, ShowStatus, ShowUpdate, TheaterInfo};
