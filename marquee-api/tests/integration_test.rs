use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use marquee_api::middleware::AdminClaims;
use marquee_api::state::{AppState, AuthConfig};
use marquee_api::{app, payments::SIGNATURE_HEADER};
use marquee_booking::coordinator::{CoordinatorConfig, ReservationCoordinator};
use marquee_booking::reconciliation::PaymentReconciler;
use marquee_catalog::movies::{MovieDetails, StaticMovieCatalog};
use marquee_catalog::pricing::PricingTiers;
use marquee_catalog::seating::SeatLayout;
use marquee_catalog::show::{Show, ShowRepository, TheaterInfo};
use marquee_core::payment::MockPaymentGateway;
use marquee_store::app_config::BusinessRules;
use marquee_store::memory::{
    MemoryBookingRepository, MemoryFavoriteRepository, MemoryShowRepository,
};

const JWT_SECRET: &str = "test-secret";
const WEBHOOK_SECRET: &str = "whsec_test";

struct TestHarness {
    state: AppState,
    shows: Arc<MemoryShowRepository>,
    gateway: Arc<MockPaymentGateway>,
}

fn harness() -> TestHarness {
    let shows = Arc::new(MemoryShowRepository::new());
    let bookings = Arc::new(MemoryBookingRepository::new());
    let favorites = Arc::new(MemoryFavoriteRepository::new());
    let gateway = Arc::new(MockPaymentGateway::new(WEBHOOK_SECRET));
    let catalog = Arc::new(StaticMovieCatalog::new(vec![MovieDetails {
        id: "mv-1".to_string(),
        title: "The Long Goodbye".to_string(),
        poster_url: Some("https://posters.example/mv-1.jpg".to_string()),
        duration_minutes: 112,
        genre: Some("Noir".to_string()),
        rating: Some(7.6),
    }]));

    let coordinator = Arc::new(ReservationCoordinator::new(
        shows.clone(),
        bookings.clone(),
        gateway.clone(),
        catalog.clone(),
        CoordinatorConfig::default(),
    ));
    let reconciler = Arc::new(PaymentReconciler::new(
        shows.clone(),
        bookings.clone(),
        gateway.clone(),
    ));

    let state = AppState {
        shows: shows.clone(),
        bookings,
        favorites,
        catalog,
        gateway: gateway.clone(),
        identity: Arc::new(marquee_core::identity::MockIdentityProvider),
        coordinator,
        reconciler,
        events: None,
        redis: None,
        auth: AuthConfig {
            secret: JWT_SECRET.to_string(),
        },
        business_rules: BusinessRules {
            refund_percent: 80,
            rate_limit_requests: 100,
            rate_limit_window_seconds: 60,
        },
    };

    TestHarness {
        state,
        shows,
        gateway,
    }
}

fn admin_token() -> String {
    let claims = AdminClaims {
        sub: "admin-1".to_string(),
        email: "admin@example.com".to_string(),
        role: "ADMIN".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn create_show(shows: &MemoryShowRepository) -> Uuid {
    let show = Show::new(
        "mv-1".to_string(),
        TheaterInfo {
            name: "Grand Cinema".to_string(),
            location: "Downtown".to_string(),
            city: "Springfield".to_string(),
        },
        NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
        "19:30".to_string(),
        "English".to_string(),
        "IMAX".to_string(),
        SeatLayout::new(
            vec!["A", "B", "C", "D", "E", "F", "G", "H"]
                .into_iter()
                .map(String::from)
                .collect(),
            10,
        ),
        PricingTiers {
            standard: 10.0,
            premium: 15.0,
            vip: 25.0,
        },
    );
    shows.create_show(&show).await.unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn booking_body(show_id: Uuid, user_id: &str, seats: &[&str], total: f64) -> Value {
    json!({
        "user_id": user_id,
        "movie_id": "mv-1",
        "show_id": show_id,
        "seats": seats,
        "total_price": total,
    })
}

#[tokio::test]
async fn test_direct_booking_claims_seats_and_blocks_overlap() {
    let h = harness();
    let show_id = create_show(&h.shows).await;

    let (status, body) = send(
        app(h.state.clone()),
        post_json("/v1/bookings", booking_body(show_id, "user-1", &["A1", "A2"], 20.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["movie"]["title"], json!("The Long Goodbye"));

    let (status, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], json!(78));
    assert_eq!(body["data"]["total"], json!(80));

    // Overlapping request names the contested seat and changes nothing
    let (status, body) = send(
        app(h.state.clone()),
        post_json("/v1/bookings", booking_body(show_id, "user-2", &["A2", "A3"], 20.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("A2"));

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(78));
}

#[tokio::test]
async fn test_payment_gated_booking_confirms_via_webhook() {
    let h = harness();
    let show_id = create_show(&h.shows).await;

    let (status, body) = send(
        app(h.state.clone()),
        post_json(
            "/v1/payments/create-payment-intent",
            booking_body(show_id, "user-1", &["B1", "B2"], 20.0),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = body["data"]["booking"]["id"].as_str().unwrap().to_string();
    let intent_id = body["data"]["payment_intent_id"].as_str().unwrap().to_string();
    assert!(body["data"]["client_secret"].as_str().is_some());

    // Seats stay unclaimed while payment is in flight
    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(80));

    h.gateway.mark_succeeded(&intent_id).await;

    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": intent_id, "status": "succeeded"}}
    })
    .to_string();
    let signature = h.gateway.sign(payload.as_bytes());

    let webhook = |payload: String, signature: String| {
        Request::builder()
            .method("POST")
            .uri("/v1/payments/webhook")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(payload))
            .unwrap()
    };

    let (status, _) = send(
        app(h.state.clone()),
        webhook(payload.clone(), signature.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/bookings/{}", booking_id)),
    )
    .await;
    assert_eq!(body["data"]["booking_status"], json!("CONFIRMED"));
    assert_eq!(body["data"]["payment_status"], json!("COMPLETED"));

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(78));

    // Webhook replay is acknowledged without double-claiming
    let (status, _) = send(app(h.state.clone()), webhook(payload, signature)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(78));
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let h = harness();

    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_unknown"}}
    })
    .to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, "deadbeef")
        .body(Body::from(payload))
        .unwrap();

    let (status, body) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_payment_failure_cancels_without_claiming() {
    let h = harness();
    let show_id = create_show(&h.shows).await;

    let (_, body) = send(
        app(h.state.clone()),
        post_json(
            "/v1/payments/create-payment-intent",
            booking_body(show_id, "user-1", &["C1"], 10.0),
        ),
    )
    .await;
    let booking_id = body["data"]["booking"]["id"].as_str().unwrap().to_string();
    let intent_id = body["data"]["payment_intent_id"].as_str().unwrap().to_string();

    h.gateway.mark_failed(&intent_id).await;

    let payload = json!({
        "id": "evt_2",
        "type": "payment_intent.payment_failed",
        "data": {"object": {"id": intent_id}}
    })
    .to_string();
    let signature = h.gateway.sign(payload.as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/bookings/{}", booking_id)),
    )
    .await;
    assert_eq!(body["data"]["booking_status"], json!("CANCELLED"));
    assert_eq!(body["data"]["payment_status"], json!("FAILED"));

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(80));
}

#[tokio::test]
async fn test_cancellation_refunds_eighty_percent_and_releases_seats() {
    let h = harness();
    let show_id = create_show(&h.shows).await;

    let (_, body) = send(
        app(h.state.clone()),
        post_json("/v1/bookings", booking_body(show_id, "user-1", &["D1", "D2"], 100.0)),
    )
    .await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    // Settle payment through the direct channel, confirming the booking
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/bookings/{}/payment", booking_id))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"payment_status": "COMPLETED"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["booking_status"], json!("CONFIRMED"));

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/bookings/{}", booking_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refund_amount"], json!(80.0));
    assert_eq!(body["data"]["booking_status"], json!("CANCELLED"));
    assert_eq!(body["data"]["payment_status"], json!("REFUNDED"));

    let (_, body) = send(
        app(h.state.clone()),
        get(&format!("/v1/shows/seats/{}", show_id)),
    )
    .await;
    assert_eq!(body["data"]["available"], json!(80));

    // Already cancelled, cannot cancel twice
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/bookings/{}", booking_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_enforces_ownership() {
    let h = harness();
    let show_id = create_show(&h.shows).await;

    let (_, body) = send(
        app(h.state.clone()),
        post_json("/v1/bookings", booking_body(show_id, "user-1", &["E1"], 10.0)),
    )
    .await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app(h.state.clone()),
        get(&format!(
            "/v1/bookings/verify?booking_id={}&user_id=user-2",
            booking_id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        app(h.state.clone()),
        get(&format!(
            "/v1/bookings/verify?booking_id={}&user_id=user-1",
            booking_id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], json!("user-1"));
}

#[tokio::test]
async fn test_admin_show_lifecycle_and_delete_guard() {
    let h = harness();
    let token = admin_token();

    let create = json!({
        "movie_id": "mv-1",
        "theater": {"name": "Grand Cinema", "location": "Downtown", "city": "Springfield"},
        "show_date": "2030-06-01",
        "show_time": "21:00",
        "language": "English",
        "format": "3D",
        "layout": {"rows": ["A", "B"], "seats_per_row": 4},
        "pricing": {"standard": 9.0, "premium": 12.0, "vip": 18.0}
    });

    // No token, no admin surface
    let (status, _) = send(
        app(h.state.clone()),
        post_json("/v1/admin/shows", create.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/admin/shows")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(create.to_string()))
        .unwrap();
    let (status, body) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::CREATED);
    let show_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(body["data"]["total_seats"], json!(8));

    let (_, _) = send(
        app(h.state.clone()),
        post_json("/v1/bookings", booking_body(show_id, "user-1", &["A1"], 9.0)),
    )
    .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/shows/{}", show_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_favorites_roundtrip() {
    let h = harness();

    let (status, _) = send(
        app(h.state.clone()),
        post_json("/v1/favorites", json!({"user_id": "user-1", "movie_id": "mv-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Second add of the same pair conflicts
    let (status, _) = send(
        app(h.state.clone()),
        post_json("/v1/favorites", json!({"user_id": "user-1", "movie_id": "mv-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(app(h.state.clone()), get("/v1/favorites/user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("DELETE")
        .uri("/v1/favorites/user-1/mv-1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(h.state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(app(h.state.clone()), get("/v1/favorites/user-1")).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_movie_lookup() {
    let h = harness();

    let (status, body) = send(app(h.state.clone()), get("/v1/movies/mv-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("The Long Goodbye"));

    let (status, _) = send(app(h.state.clone()), get("/v1/movies/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
