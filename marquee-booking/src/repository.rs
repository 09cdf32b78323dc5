use async_trait::async_trait;
use uuid::Uuid;

use marquee_core::CoreResult;

use crate::models::{Booking, PaymentState};

/// Repository trait for the booking ledger.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> CoreResult<Uuid>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Persist lifecycle fields (statuses, cancellation, refund, payment
    /// reference) of an existing booking.
    async fn update_booking(&self, booking: &Booking) -> CoreResult<()>;

    /// Hard delete. Only used for payment-gated bookings abandoned before
    /// payment ever completed.
    async fn delete_booking(&self, id: Uuid) -> CoreResult<()>;

    /// All bookings for a user, most recent first.
    async fn list_user_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>>;

    /// Confirmed bookings whose show is still ahead, soonest first.
    async fn list_active_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>>;

    /// Bookings whose show has passed, any status, most recent show first.
    async fn list_past_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>>;

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentState,
        payment_reference: Option<&str>,
    ) -> CoreResult<()>;

    async fn update_special_requests(&self, id: Uuid, notes: Option<&str>) -> CoreResult<()>;

    async fn find_by_payment_reference(&self, reference: &str) -> CoreResult<Option<Booking>>;

    /// True while any booking references the show; guards show deletion.
    async fn bookings_exist_for_show(&self, show_id: Uuid) -> CoreResult<bool>;
}
