//! Request/response models for the affiliate endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    errors,
    models::affiliates::{AffiliateStatsDBResponse, CommissionMode, CustomerLinkDBResponse},
};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckCustomerParams {
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackClickParams {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AffiliateStatsParams {
    pub code: Option<String>,
}

/// Reduced projection of the customer linkage row
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub purchase_count: i64,
    pub total_profit: Decimal,
}

/// The referring affiliate, as exposed to clients
#[derive(Debug, Clone, Serialize)]
pub struct AffiliateSummary {
    pub affiliate_code: String,
    pub commission_mode: CommissionMode,
    pub commission_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckCustomerResponse {
    pub found: bool,
    pub customer: Option<CustomerSummary>,
    pub affiliate: Option<AffiliateSummary>,
}

impl CheckCustomerResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            customer: None,
            affiliate: None,
        }
    }

    /// Collapse a lookup outcome into the client contract: the caller only
    /// needs to know whether to apply attribution, so "no matching row" and
    /// "lookup failed" both come back as `found: false`. The failure path is
    /// logged at warn before it disappears from the response.
    pub fn from_lookup(outcome: errors::Result<Option<CustomerLinkDBResponse>>) -> Self {
        match outcome {
            Ok(Some(link)) => Self {
                found: true,
                customer: Some(CustomerSummary {
                    email: link.customer_email,
                    user_id: link.customer_user_id,
                    first_purchase_at: link.first_purchase_at,
                    purchase_count: link.purchase_count,
                    total_profit: link.total_profit,
                }),
                affiliate: Some(AffiliateSummary {
                    affiliate_code: link.affiliate.affiliate_code,
                    commission_mode: link.affiliate.commission_mode,
                    commission_rate: link.affiliate.commission_rate,
                }),
            },
            Ok(None) => Self::not_found(),
            Err(err) => {
                tracing::warn!(error = %err, "customer lookup failed; reporting not found");
                Self::not_found()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackClickResponse {
    pub found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateStatsResponse {
    pub success: bool,
    pub stats: AffiliateStatsDBResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::models::affiliates::AffiliateDBResponse;

    fn link(code: &str) -> CustomerLinkDBResponse {
        CustomerLinkDBResponse {
            customer_email: Some("a@b.com".to_string()),
            customer_user_id: None,
            first_purchase_at: Some(Utc::now()),
            purchase_count: 3,
            total_profit: "120.00".parse().unwrap(),
            affiliate: AffiliateDBResponse {
                id: Uuid::new_v4(),
                affiliate_code: code.to_string(),
                email: "aff@example.com".to_string(),
                commission_mode: CommissionMode::Flat,
                commission_rate: "0.10".parse().unwrap(),
                click_count: 42,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_found_projects_customer_and_affiliate() {
        let response = CheckCustomerResponse::from_lookup(Ok(Some(link("X1"))));
        assert!(response.found);
        assert_eq!(response.affiliate.as_ref().unwrap().affiliate_code, "X1");
        let customer = response.customer.unwrap();
        assert_eq!(customer.email.as_deref(), Some("a@b.com"));
        assert_eq!(customer.purchase_count, 3);
    }

    #[test]
    fn test_no_row_collapses_to_not_found() {
        let response = CheckCustomerResponse::from_lookup(Ok(None));
        assert!(!response.found);
        assert!(response.customer.is_none());
        assert!(response.affiliate.is_none());
    }

    #[test]
    fn test_lookup_failure_collapses_to_not_found() {
        let response = CheckCustomerResponse::from_lookup(Err(DbError::Other(anyhow::anyhow!("connection refused"))));
        assert!(!response.found);
        assert!(response.customer.is_none());
        assert!(response.affiliate.is_none());
    }
}
