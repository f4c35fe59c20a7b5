//! Order and photo-order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "failed" => Ok(OrderStatus::Failed),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(anyhow::anyhow!("unknown order status: {other}")),
        }
    }
}

/// Which external service took the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProviderKind {
    Paypal,
    Strike,
    Fourthwall,
}

impl PaymentProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProviderKind::Paypal => "paypal",
            PaymentProviderKind::Strike => "strike",
            PaymentProviderKind::Fourthwall => "fourthwall",
        }
    }
}

impl fmt::Display for PaymentProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paypal" => Ok(PaymentProviderKind::Paypal),
            "strike" => Ok(PaymentProviderKind::Strike),
            "fourthwall" => Ok(PaymentProviderKind::Fourthwall),
            other => Err(anyhow::anyhow!("unknown payment provider: {other}")),
        }
    }
}

/// Order record as returned by repositories
#[derive(Debug, Clone, Serialize)]
pub struct OrderDBResponse {
    pub id: OrderId,
    pub email: String,
    pub status: OrderStatus,
    pub provider: PaymentProviderKind,
    pub provider_order_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub affiliate_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create an order
#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub email: String,
    pub provider: PaymentProviderKind,
    pub amount: Decimal,
    pub currency: String,
    pub affiliate_code: Option<String>,
    /// When set, a photo_orders row is created alongside the order and a
    /// media entitlement is granted on payment.
    pub collection_slug: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Failed, OrderStatus::Refunded] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_provider_roundtrip() {
        for provider in [
            PaymentProviderKind::Paypal,
            PaymentProviderKind::Strike,
            PaymentProviderKind::Fourthwall,
        ] {
            assert_eq!(provider.as_str().parse::<PaymentProviderKind>().unwrap(), provider);
        }
    }
}
