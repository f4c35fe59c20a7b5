//! Request/response models for the admin endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::handlers::analytics::AnalyticsEntry;
use crate::db::models::affiliates::{AffiliateDBResponse, CommissionMode};
use crate::db::models::orders::OrderDBResponse;

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsStatsResponse {
    pub success: bool,
    pub analytics: Vec<AnalyticsEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminOrdersParams {
    pub status: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOrdersResponse {
    pub success: bool,
    pub orders: Vec<OrderDBResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAffiliateRequest {
    pub affiliate_code: String,
    pub email: String,
    pub commission_mode: CommissionMode,
    pub commission_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAffiliateResponse {
    pub success: bool,
    pub affiliate: AffiliateDBResponse,
}
