pub mod coordinator;
pub mod models;
pub mod reconciliation;
pub mod repository;

pub use coordinator::{CreateBookingRequest, ReservationCoordinator};
pub use models::{Booking, BookingStatus, BookingSummary, MovieSnapshot, PaymentState};
pub use reconciliation::PaymentReconciler;
pub use repository::BookingRepository;
