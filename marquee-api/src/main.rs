use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use marquee_api::{app, state::{AppState, AuthConfig}};
use marquee_booking::coordinator::{CoordinatorConfig, ReservationCoordinator};
use marquee_booking::reconciliation::PaymentReconciler;
use marquee_catalog::movies::StaticMovieCatalog;
use marquee_core::identity::MockIdentityProvider;
use marquee_core::payment::MockPaymentGateway;
use marquee_store::booking_repo::StoreBookingRepository;
use marquee_store::favorite_repo::StoreFavoriteRepository;
use marquee_store::show_repo::StoreShowRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = marquee_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let db = marquee_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis_client = marquee_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    let kafka_producer = marquee_store::EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");

    let shows = Arc::new(StoreShowRepository::new(db.pool.clone()));
    let bookings = Arc::new(StoreBookingRepository::new(db.pool.clone()));
    let favorites = Arc::new(StoreFavoriteRepository::new(db.pool.clone()));
    let catalog = Arc::new(StaticMovieCatalog::empty());
    // In-process gateway; swap for a real provider client behind the same trait
    let gateway = Arc::new(MockPaymentGateway::new(&config.payment.webhook_secret));

    let coordinator = Arc::new(ReservationCoordinator::new(
        shows.clone(),
        bookings.clone(),
        gateway.clone(),
        catalog.clone(),
        CoordinatorConfig {
            refund_percent: config.business_rules.refund_percent,
            payment_timeout: Duration::from_secs(config.payment.timeout_seconds),
            currency: config.payment.currency.clone(),
        },
    ));
    let reconciler = Arc::new(PaymentReconciler::new(
        shows.clone(),
        bookings.clone(),
        gateway.clone(),
    ));

    let app_state = AppState {
        shows,
        bookings,
        favorites,
        catalog,
        gateway,
        identity: Arc::new(MockIdentityProvider),
        coordinator,
        reconciler,
        events: Some(Arc::new(kafka_producer)),
        redis: Some(Arc::new(redis_client)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
