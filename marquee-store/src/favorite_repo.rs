use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marquee_catalog::movies::{Favorite, FavoriteRepository};
use marquee_core::{CoreError, CoreResult};

use crate::show_repo::db_err;

pub struct StoreFavoriteRepository {
    pool: PgPool,
}

impl StoreFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    user_id: String,
    movie_id: String,
    created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            user_id: row.user_id,
            movie_id: row.movie_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FavoriteRepository for StoreFavoriteRepository {
    async fn add_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<Favorite> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, movie_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Favorite {
                user_id: user_id.to_string(),
                movie_id: movie_id.to_string(),
                created_at,
            }),
            Err(sqlx::Error::Database(db))
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                Err(CoreError::Conflict(format!(
                    "Movie {} is already a favorite",
                    movie_id
                )))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn remove_favorite(&self, user_id: &str, movie_id: &str) -> CoreResult<()> {
        let done = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Favorite {}", movie_id)));
        }
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> CoreResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            "SELECT user_id, movie_id, created_at FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Favorite::from).collect())
    }
}
