//! Request/response models for the shop endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::models::orders::{OrderDBResponse, OrderStatus, PaymentProviderKind};
use crate::types::OrderId;

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub email: String,
    pub provider: PaymentProviderKind,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub affiliate_code: Option<String>,
    /// Present for photo orders; grants a media entitlement on payment
    pub collection_slug: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub provider_order_id: String,
    /// Hosted checkout URL (PayPal approval link)
    pub checkout_url: Option<String>,
    /// Lightning payment request (Strike quote)
    pub payment_request: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureOrderResponse {
    pub success: bool,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: OrderDBResponse,
}
