use std::sync::Arc;

use marquee_booking::coordinator::ReservationCoordinator;
use marquee_booking::reconciliation::PaymentReconciler;
use marquee_booking::repository::BookingRepository;
use marquee_catalog::movies::{FavoriteRepository, MovieCatalog};
use marquee_catalog::show::ShowRepository;
use marquee_core::identity::IdentityProvider;
use marquee_core::payment::PaymentGateway;
use marquee_store::app_config::BusinessRules;
use marquee_store::{EventProducer, RedisClient};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub shows: Arc<dyn ShowRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub identity: Arc<dyn IdentityProvider>,
    pub coordinator: Arc<ReservationCoordinator>,
    pub reconciler: Arc<PaymentReconciler>,
    // Both are optional so the router can run without brokers in tests
    pub events: Option<Arc<EventProducer>>,
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
