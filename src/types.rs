//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`AffiliateId`]: Affiliate account identifier
//! - [`OrderId`]: Shop order identifier
//! - [`EntitlementId`]: Media access grant identifier
//! - [`CampaignId`]: Newsletter campaign identifier
//! - [`SubscriberId`]: Newsletter subscriber identifier
//! - [`PostId`]: Blog post identifier

use uuid::Uuid;

pub type AffiliateId = Uuid;
pub type OrderId = Uuid;
pub type EntitlementId = Uuid;
pub type CampaignId = Uuid;
pub type SubscriberId = Uuid;
pub type PostId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
