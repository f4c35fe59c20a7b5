//! Media entitlement models.
//!
//! An entitlement is a time-bounded access grant: `expires_at` is compared
//! against now at read time by the streaming proxy. Nothing enforces expiry
//! in the background.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::{EntitlementId, OrderId};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EntitlementDBResponse {
    pub id: EntitlementId,
    pub order_id: OrderId,
    pub collection_slug: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EntitlementDBResponse {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn entitlement(expires_at: DateTime<Utc>) -> EntitlementDBResponse {
        EntitlementDBResponse {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            collection_slug: "summer-2025".to_string(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        assert!(entitlement(now - Duration::seconds(1)).is_expired(now));
        assert!(entitlement(now).is_expired(now));
        assert!(!entitlement(now + Duration::hours(48)).is_expired(now));
    }
}
