//! HTTP handlers for the shop endpoints: order creation, capture and
//! fulfilment.

use bytes::Bytes;
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    AppState,
    api::handlers::{parse_json_body, split_segment, unknown_endpoint, validate_email},
    api::models::orders::{CaptureOrderResponse, CreateOrderRequest, CreateOrderResponse, OrderResponse},
    db::{
        errors::DbError,
        handlers::{affiliates::Affiliates, entitlements::Entitlements, orders::Orders},
        models::orders::{OrderCreateDBRequest, OrderDBResponse, PaymentProviderKind},
    },
    email::EmailService,
    errors::{Error, Result},
    payment_providers::{CheckoutSession, paypal::PayPalClient, strike::StrikeClient},
};

/// GET dispatch for `/api/shop/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_get(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let (segment, rest) = split_segment(&path);
    match (segment, rest) {
        ("orders", id) if !id.is_empty() && !id.contains('/') => get_order(state, id).await,
        (other, _) => Err(unknown_endpoint("shop", other)),
    }
}

/// POST dispatch for `/api/shop/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_post(State(state): State<AppState>, Path(path): Path<String>, body: Bytes) -> Result<Response> {
    let (segment, rest) = split_segment(&path);
    match (segment, rest) {
        ("orders", "") => create_order(state, &body).await,
        ("orders", rest) => match rest.split_once('/') {
            Some((id, "capture")) => capture_order(state, id).await,
            _ => Err(unknown_endpoint("shop", segment)),
        },
        (other, _) => Err(unknown_endpoint("shop", other)),
    }
}

fn parse_order_id(raw: &str) -> Result<Uuid> {
    raw.parse().map_err(|_| Error::bad_request("order id must be a UUID"))
}

/// `POST /api/shop/orders`
///
/// Creates the pending order row, then the provider checkout. The provider
/// must be configured; otherwise the request gets a 501.
async fn create_order(state: AppState, body: &[u8]) -> Result<Response> {
    let request: CreateOrderRequest = parse_json_body(body)?;
    validate_email(&request.email)?;
    if request.amount.is_sign_negative() || request.amount.is_zero() {
        return Err(Error::bad_request("amount must be positive"));
    }

    let order = {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Orders::new(&mut conn)
            .create(&OrderCreateDBRequest {
                email: request.email.trim().to_ascii_lowercase(),
                provider: request.provider,
                amount: request.amount,
                currency: request.currency.clone(),
                affiliate_code: request.affiliate_code.clone(),
                collection_slug: request.collection_slug.clone(),
            })
            .await?
    };

    let session = create_provider_checkout(&state, &order).await?;

    {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Orders::new(&mut conn).set_provider_order_id(order.id, &session.provider_order_id).await?;
    }

    tracing::info!(order_id = %order.id, provider = %order.provider, "order created");

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id,
        provider_order_id: session.provider_order_id,
        checkout_url: session.checkout_url,
        payment_request: session.payment_request,
    })
    .into_response())
}

async fn create_provider_checkout(state: &AppState, order: &OrderDBResponse) -> Result<CheckoutSession> {
    match order.provider {
        PaymentProviderKind::Paypal => {
            let config = state.config.payments.paypal.as_ref().ok_or_else(|| Error::NotImplemented {
                message: "PayPal is not configured".to_string(),
            })?;
            PayPalClient::new(config)
                .create_order(order.amount, &order.currency, &order.id.to_string())
                .await
        }
        PaymentProviderKind::Strike => {
            let config = state.config.payments.strike.as_ref().ok_or_else(|| Error::NotImplemented {
                message: "Strike is not configured".to_string(),
            })?;
            StrikeClient::new(config)
                .create_checkout(order.amount, &order.currency, "Storefront order", &order.id.to_string())
                .await
        }
        // Fourthwall carts are created on the provider's storefront; orders
        // arrive here only through its webhook.
        PaymentProviderKind::Fourthwall => Err(Error::bad_request("Fourthwall orders are recorded via webhook")),
    }
}

/// `POST /api/shop/orders/{id}/capture`
///
/// Captures the approved PayPal order and fulfils it. Idempotent: capturing
/// an already-paid order reports success without re-recording attribution.
async fn capture_order(state: AppState, raw_id: &str) -> Result<Response> {
    let order_id = parse_order_id(raw_id)?;

    let order = {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Orders::new(&mut conn).get_by_id(order_id).await?
    }
    .ok_or_else(|| Error::NotFound {
        resource: "order".to_string(),
        id: raw_id.to_string(),
    })?;

    if order.provider != PaymentProviderKind::Paypal {
        return Err(Error::bad_request("Only PayPal orders are captured through this endpoint"));
    }

    let provider_order_id = order.provider_order_id.clone().ok_or_else(|| Error::Internal {
        operation: "capture an order with no provider order id".to_string(),
    })?;

    let config = state.config.payments.paypal.as_ref().ok_or_else(|| Error::NotImplemented {
        message: "PayPal is not configured".to_string(),
    })?;

    let completed = PayPalClient::new(config).capture_order(&provider_order_id).await?;
    if !completed {
        return Err(Error::bad_request("Payment has not completed"));
    }

    let fulfilled = fulfil_order(&state, &order).await?;
    let status = fulfilled.map(|order| order.status).unwrap_or(order.status);

    Ok(Json(CaptureOrderResponse { success: true, status }).into_response())
}

/// `GET /api/shop/orders/{id}` - order status polling
async fn get_order(state: AppState, raw_id: &str) -> Result<Response> {
    let order_id = parse_order_id(raw_id)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let order = Orders::new(&mut conn).get_by_id(order_id).await?.ok_or_else(|| Error::NotFound {
        resource: "order".to_string(),
        id: raw_id.to_string(),
    })?;

    Ok(Json(OrderResponse { success: true, order }).into_response())
}

/// Mark an order paid and run fulfilment: affiliate attribution, entitlement
/// grant for photo orders, and a best-effort confirmation mail.
///
/// Returns None when the order was already paid - the caller treats that as
/// success without repeating any side effect.
pub(crate) async fn fulfil_order(state: &AppState, order: &OrderDBResponse) -> Result<Option<OrderDBResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let Some(paid) = Orders::new(&mut conn).mark_paid(order.id).await? else {
        tracing::debug!(order_id = %order.id, "order already paid; skipping fulfilment");
        return Ok(None);
    };

    // Attribution is best effort: a broken affiliate record must not fail the
    // customer's payment.
    if let Some(code) = &paid.affiliate_code {
        match Affiliates::new(&mut conn).record_purchase(code, &paid.email, paid.amount).await {
            Ok(Some(attribution)) => {
                tracing::info!(
                    affiliate = %attribution.affiliate_code,
                    purchase_count = attribution.purchase_count,
                    commission = %attribution.commission,
                    "recorded affiliate purchase"
                );
            }
            Ok(None) => tracing::warn!(code = %code, "order carried an unknown affiliate code"),
            Err(err) => tracing::warn!(error = %err, "affiliate attribution failed"),
        }
    }

    if let Some(collection_slug) = Orders::new(&mut conn).photo_collection(paid.id).await? {
        Entitlements::new(&mut conn)
            .grant(paid.id, &collection_slug, state.config.entitlement_ttl_hours)
            .await?;
    }

    match EmailService::new(&state.config) {
        Ok(service) => {
            if let Err(err) = service
                .send_order_confirmation(&paid.email, &paid.id, &paid.amount.to_string(), &paid.currency)
                .await
            {
                tracing::warn!(error = %err, "order confirmation email failed");
            }
        }
        Err(err) => tracing::warn!(error = %err, "email service unavailable"),
    }

    Ok(Some(paid))
}
