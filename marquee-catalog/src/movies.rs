use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use marquee_core::CoreResult;

/// Metadata from the external movie catalog. Bookings copy what they need
/// at creation time; this struct is never held by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub duration_minutes: i32,
    pub genre: Option<String>,
    pub rating: Option<f64>,
}

/// Read-only gateway to the third-party movie catalog.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn get_movie(
        &self,
        movie_id: &str,
    ) -> Result<Option<MovieDetails>, Box<dyn std::error::Error + Send + Sync>>;
}

/// In-process catalog used by tests and local development.
pub struct StaticMovieCatalog {
    movies: HashMap<String, MovieDetails>,
}

impl StaticMovieCatalog {
    pub fn new(movies: Vec<MovieDetails>) -> Self {
        Self {
            movies: movies.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            movies: HashMap::new(),
        }
    }
}

#[async_trait]
impl MovieCatalog for StaticMovieCatalog {
    async fn get_movie(
        &self,
        movie_id: &str,
    ) -> Result<Option<MovieDetails>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.movies.get(movie_id).cloned())
    }
}

/// Join of user and movie; unique on the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: String,
    pub movie_id: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Fails with `Conflict` when the (user, movie) pair already exists.
    async fn add_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<Favorite>;

    async fn remove_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<()>;

    async fn list_favorites(&self, user_id: &str) -> CoreResult<Vec<Favorite>>;
}
