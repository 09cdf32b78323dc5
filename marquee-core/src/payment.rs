use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

/// External gateway object representing an authorized-but-not-yet-settled
/// charge attempt. `client_secret` is handed to the client to complete
/// payment; it is never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String, // Provider's ID (e.g., pi_123)
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub object: PaymentIntentObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with the provider. Amount is in minor
    /// currency units.
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: serde_json::Value,
    ) -> CoreResult<PaymentIntent>;

    /// Retrieve intent status
    async fn get_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent>;

    /// Cancel an intent that has not settled yet
    async fn cancel_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent>;

    /// Issue a refund against a settled intent; returns the provider refund id
    async fn refund(&self, intent_id: &str, reason: Option<&str>) -> CoreResult<String>;

    /// Verify a webhook payload against the shared secret and decode it.
    /// Unverifiable payloads are rejected without being parsed further.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> CoreResult<WebhookEvent>;
}

fn compute_signature(secret: &str, payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// In-process gateway used by tests and local development. Intents live in
/// a map; `mark_succeeded`/`mark_failed` simulate the provider settling.
pub struct MockPaymentGateway {
    webhook_secret: String,
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MockPaymentGateway {
    pub fn new(webhook_secret: &str) -> Self {
        Self {
            webhook_secret: webhook_secret.to_string(),
            intents: Mutex::new(HashMap::new()),
        }
    }

    /// Produce a signature the gateway itself would accept.
    pub fn sign(&self, payload: &[u8]) -> String {
        compute_signature(&self.webhook_secret, payload)
    }

    pub async fn mark_succeeded(&self, intent_id: &str) {
        if let Some(intent) = self.intents.lock().await.get_mut(intent_id) {
            intent.status = PaymentIntentStatus::Succeeded;
        }
    }

    pub async fn mark_failed(&self, intent_id: &str) {
        if let Some(intent) = self.intents.lock().await.get_mut(intent_id) {
            intent.status = PaymentIntentStatus::Failed;
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: serde_json::Value,
    ) -> CoreResult<PaymentIntent> {
        if amount_minor < 0 {
            return Err(CoreError::InvalidArgument(
                "Payment amount cannot be negative".to_string(),
            ));
        }
        // Trigger for testing failure handling at the coordinator
        if metadata.get("fail_intent").is_some() {
            return Err(CoreError::Upstream("Simulated gateway outage".to_string()));
        }

        let id = format!("pi_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: id.clone(),
            amount_minor,
            currency: currency.to_string(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("{}_secret_{}", id, Uuid::new_v4().simple())),
            metadata,
            created_at: Utc::now(),
        };

        self.intents.lock().await.insert(id, intent.clone());
        Ok(intent)
    }

    async fn get_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent> {
        self.intents
            .lock()
            .await
            .get(intent_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("Payment intent {}", intent_id)))
    }

    async fn cancel_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent> {
        let mut intents = self.intents.lock().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| CoreError::NotFound(format!("Payment intent {}", intent_id)))?;

        if intent.status == PaymentIntentStatus::Succeeded {
            return Err(CoreError::InvalidState(
                "Cannot cancel a settled payment intent".to_string(),
            ));
        }
        intent.status = PaymentIntentStatus::Canceled;
        Ok(intent.clone())
    }

    async fn refund(&self, intent_id: &str, reason: Option<&str>) -> CoreResult<String> {
        let intents = self.intents.lock().await;
        let intent = intents
            .get(intent_id)
            .ok_or_else(|| CoreError::NotFound(format!("Payment intent {}", intent_id)))?;

        if intent.status != PaymentIntentStatus::Succeeded {
            return Err(CoreError::InvalidState(
                "Only settled payments can be refunded".to_string(),
            ));
        }

        tracing::info!(intent_id, reason = reason.unwrap_or("none"), "Refund issued");
        Ok(format!("re_{}", Uuid::new_v4().simple()))
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> CoreResult<WebhookEvent> {
        let expected = compute_signature(&self.webhook_secret, payload);
        if !constant_time_eq::constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(CoreError::Unauthorized(
                "Webhook signature verification failed".to_string(),
            ));
        }

        serde_json::from_slice(payload)
            .map_err(|e| CoreError::InvalidArgument(format!("Malformed webhook payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_intent_lifecycle() {
        let gateway = MockPaymentGateway::new("whsec_test");
        let intent = gateway
            .create_intent(5000, "USD", serde_json::json!({"booking_id": "b1"}))
            .await
            .unwrap();

        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert!(intent.client_secret.is_some());

        gateway.mark_succeeded(&intent.id).await;
        let fetched = gateway.get_intent(&intent.id).await.unwrap();
        assert_eq!(fetched.status, PaymentIntentStatus::Succeeded);

        // Settled intents cannot be cancelled, only refunded
        assert!(gateway.cancel_intent(&intent.id).await.is_err());
        let refund_id = gateway.refund(&intent.id, Some("requested")).await.unwrap();
        assert!(refund_id.starts_with("re_"));
    }

    #[tokio::test]
    async fn test_webhook_signature_round_trip() {
        let gateway = MockPaymentGateway::new("whsec_test");
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_abc", "status": "succeeded"}}
        })
        .to_string();

        let sig = gateway.sign(payload.as_bytes());
        let event = gateway
            .verify_webhook_signature(payload.as_bytes(), &sig)
            .unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.data.object.id, "pi_abc");

        let err = gateway.verify_webhook_signature(payload.as_bytes(), "deadbeef");
        assert!(matches!(err, Err(CoreError::Unauthorized(_))));
    }
}
