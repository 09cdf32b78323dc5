use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{ok, ok_message, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/favorites", post(add_favorite))
        .route("/v1/favorites/{user_id}", get(list_favorites))
        .route("/v1/favorites/{user_id}/{movie_id}", delete(remove_favorite))
}

#[derive(Debug, Deserialize)]
struct AddFavoriteRequest {
    user_id: String,
    movie_id: String,
}

async fn add_favorite(
    State(state): State<AppState>,
    Json(req): Json<AddFavoriteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let favorite = state
        .favorites
        .add_favorite(&req.user_id, &req.movie_id)
        .await?;
    Ok(ok_message(favorite, "Favorite added"))
}

async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let favorites = state.favorites.list_favorites(&user_id).await?;
    Ok(ok(favorites))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.favorites.remove_favorite(&user_id, &movie_id).await?;
    Ok(ok_message(
        serde_json::json!({"movie_id": movie_id}),
        "Favorite removed",
    ))
}
