use axum::{extract::State, http::Method, response::IntoResponse, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod favorites;
pub mod middleware;
pub mod movies;
pub mod payments;
pub mod shows;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(bookings::routes())
        .merge(payments::routes())
        .merge(shows::routes())
        .merge(admin::routes(state.clone()))
        .merge(movies::routes())
        .merge(favorites::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let redis = match &state.redis {
        Some(redis) => redis.clone(),
        None => return Ok(next.run(req).await),
    };
    // ConnectInfo is absent when the router is driven in-process (tests)
    let ip = match req
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
    {
        Some(info) => info.0.ip().to_string(),
        None => return Ok(next.run(req).await),
    };

    let key = format!("ratelimit:{}", ip);
    let limit = state.business_rules.rate_limit_requests;
    let window = state.business_rules.rate_limit_window_seconds;

    match redis.check_rate_limit(&key, limit, window).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        )),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
