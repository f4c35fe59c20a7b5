//! Affiliate and affiliate-customer models, plus commission computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::AffiliateId;

/// How an affiliate's commission is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionMode {
    /// A fixed rate on every attributed purchase
    Flat,
    /// The rate escalates with the customer's cumulative purchase count
    Tiered,
}

impl CommissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionMode::Flat => "flat",
            CommissionMode::Tiered => "tiered",
        }
    }
}

impl fmt::Display for CommissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(CommissionMode::Flat),
            "tiered" => Ok(CommissionMode::Tiered),
            other => Err(anyhow::anyhow!("unknown commission mode: {other}")),
        }
    }
}

/// The rate ceiling no tier multiplier may exceed.
const MAX_EFFECTIVE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

/// Effective commission rate for a purchase, given the customer's cumulative
/// purchase count *including* the purchase being recorded.
///
/// Flat mode always uses the base rate. Tiered mode escalates: the first
/// purchase pays the base rate, purchases 2-4 pay 1.25x, the fifth and later
/// pay 1.5x. The effective rate is capped at 0.5 in both modes.
pub fn effective_rate(mode: CommissionMode, base_rate: Decimal, purchase_count: i64) -> Decimal {
    let multiplier = match mode {
        CommissionMode::Flat => Decimal::ONE,
        CommissionMode::Tiered => match purchase_count {
            i64::MIN..=1 => Decimal::ONE,
            2..=4 => Decimal::new(125, 2),
            _ => Decimal::new(150, 2),
        },
    };

    (base_rate * multiplier).min(MAX_EFFECTIVE_RATE)
}

/// Commission owed on an attributed purchase.
pub fn commission_for(mode: CommissionMode, base_rate: Decimal, purchase_count: i64, profit: Decimal) -> Decimal {
    profit * effective_rate(mode, base_rate, purchase_count)
}

/// Affiliate record as returned by repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateDBResponse {
    pub id: AffiliateId,
    pub affiliate_code: String,
    pub email: String,
    pub commission_mode: CommissionMode,
    pub commission_rate: Decimal,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Request to create an affiliate
#[derive(Debug, Clone)]
pub struct AffiliateCreateDBRequest {
    pub affiliate_code: String,
    pub email: String,
    pub commission_mode: CommissionMode,
    pub commission_rate: Decimal,
}

/// A customer's affiliate linkage, with the joined affiliate record
#[derive(Debug, Clone)]
pub struct CustomerLinkDBResponse {
    pub customer_email: Option<String>,
    pub customer_user_id: Option<Uuid>,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub purchase_count: i64,
    pub total_profit: Decimal,
    pub affiliate: AffiliateDBResponse,
}

/// Outcome of recording an attributed purchase
#[derive(Debug, Clone)]
pub struct PurchaseAttribution {
    pub affiliate_id: AffiliateId,
    pub affiliate_code: String,
    /// Cumulative purchase count after this purchase
    pub purchase_count: i64,
    pub commission: Decimal,
}

/// Aggregated totals for one affiliate
#[derive(Debug, Clone, Serialize)]
pub struct AffiliateStatsDBResponse {
    pub affiliate_code: String,
    pub clicks: i64,
    pub customers: i64,
    pub purchases: i64,
    pub total_profit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_flat_rate_ignores_purchase_count() {
        for count in [1, 2, 5, 100] {
            assert_eq!(effective_rate(CommissionMode::Flat, dec("0.10"), count), dec("0.10"));
        }
    }

    #[test]
    fn test_tiered_rate_escalates() {
        let base = dec("0.10");
        assert_eq!(effective_rate(CommissionMode::Tiered, base, 1), dec("0.10"));
        assert_eq!(effective_rate(CommissionMode::Tiered, base, 2), dec("0.125"));
        assert_eq!(effective_rate(CommissionMode::Tiered, base, 4), dec("0.125"));
        assert_eq!(effective_rate(CommissionMode::Tiered, base, 5), dec("0.15"));
        assert_eq!(effective_rate(CommissionMode::Tiered, base, 50), dec("0.15"));
    }

    #[test]
    fn test_rate_capped_at_half() {
        assert_eq!(effective_rate(CommissionMode::Tiered, dec("0.40"), 5), dec("0.5"));
        assert_eq!(effective_rate(CommissionMode::Flat, dec("0.75"), 1), dec("0.5"));
    }

    #[test]
    fn test_commission_amount() {
        // 100.00 profit at 10% flat
        assert_eq!(commission_for(CommissionMode::Flat, dec("0.10"), 3, dec("100.00")), dec("10.0000"));
        // fifth tiered purchase: 100.00 * 0.15
        assert_eq!(commission_for(CommissionMode::Tiered, dec("0.10"), 5, dec("100.00")), dec("15.0000"));
    }

    #[test]
    fn test_commission_mode_roundtrip() {
        assert_eq!("flat".parse::<CommissionMode>().unwrap(), CommissionMode::Flat);
        assert_eq!("tiered".parse::<CommissionMode>().unwrap(), CommissionMode::Tiered);
        assert!("percentage".parse::<CommissionMode>().is_err());
        assert_eq!(CommissionMode::Tiered.as_str(), "tiered");
    }
}
