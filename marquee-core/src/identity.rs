use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: marquee_shared::pii::Masked<String>,
    pub role: String,
}

/// The platform never embeds a specific identity provider's client; it only
/// needs a stable user identifier and a role claim.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, user_id: &str) -> CoreResult<UserProfile>;
}

pub struct MockIdentityProvider;

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_user(&self, user_id: &str) -> CoreResult<UserProfile> {
        if user_id.trim().is_empty() {
            return Err(CoreError::InvalidArgument("Empty user id".to_string()));
        }

        tracing::debug!(user_id, "Resolving user via mock identity provider");

        Ok(UserProfile {
            id: user_id.to_string(),
            email: marquee_shared::pii::Masked(format!("{}@example.com", user_id)),
            role: "CUSTOMER".to_string(),
        })
    }
}
