use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use marquee_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, PaymentSettledEvent, SeatsClaimedEvent,
};

pub const TOPIC_BOOKINGS: &str = "marquee.bookings";
pub const TOPIC_PAYMENTS: &str = "marquee.payments";

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    pub async fn seats_claimed(&self, event: &SeatsClaimedEvent) {
        self.publish_json(TOPIC_BOOKINGS, &event.booking_id.to_string(), event)
            .await;
    }

    pub async fn booking_confirmed(&self, event: &BookingConfirmedEvent) {
        self.publish_json(TOPIC_BOOKINGS, &event.booking_id.to_string(), event)
            .await;
    }

    pub async fn booking_cancelled(&self, event: &BookingCancelledEvent) {
        self.publish_json(TOPIC_BOOKINGS, &event.booking_id.to_string(), event)
            .await;
    }

    pub async fn payment_settled(&self, event: &PaymentSettledEvent) {
        self.publish_json(TOPIC_PAYMENTS, &event.booking_id.to_string(), event)
            .await;
    }

    // Event delivery is best effort; a broker outage never fails the request.
    async fn publish_json<T: serde::Serialize>(&self, topic: &str, key: &str, event: &T) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                if let Err(e) = self.publish(topic, key, &payload).await {
                    error!("Event publish to {} failed: {}", topic, e);
                }
            }
            Err(e) => error!("Event serialization failed: {}", e),
        }
    }
}
