//! Payment webhook handlers.
//!
//! Strike events are HMAC-verified when a webhook secret is configured;
//! Fourthwall events are accepted as-is. Both handlers acknowledge processed
//! and ignored events with 200 so the provider does not retry; only a
//! malformed body or a bad signature is an error.

use bytes::Bytes;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    api::handlers::shop::fulfil_order,
    crypto,
    db::{
        errors::DbError,
        handlers::{affiliates::Affiliates, orders::Orders},
        models::orders::{OrderCreateDBRequest, PaymentProviderKind},
    },
    errors::{Error, Result},
};

/// Explicit OPTIONS handler for the webhook routes: 200, no body, permissive
/// CORS headers.
pub async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, X-Webhook-Signature"),
        ],
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrikeEvent {
    event_type: String,
    data: StrikeEventData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrikeEventData {
    entity_id: String,
}

/// `POST /api/webhooks/strike`
///
/// Invoice state events. The entity id is the invoice id we stored as the
/// order's provider_order_id at checkout.
#[tracing::instrument(skip_all)]
pub async fn strike(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response> {
    if let Some(secret) = state.config.payments.strike.as_ref().and_then(|strike| strike.webhook_secret.as_deref()) {
        let signature = headers
            .get("x-webhook-signature")
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::Unauthenticated)?;

        if !crypto::verify_signature(&body, signature, secret) {
            tracing::warn!("strike webhook signature verification failed");
            return Err(Error::Unauthenticated);
        }
    }

    let event: StrikeEvent = serde_json::from_slice(&body).map_err(|e| Error::BadRequest {
        message: format!("Invalid webhook body: {e}"),
    })?;

    tracing::info!(event_type = %event.event_type, "received strike webhook");

    match event.event_type.as_str() {
        "invoice.paid" | "invoice.updated" => {
            let order = {
                let mut conn = state.db.acquire().await.map_err(DbError::from)?;
                Orders::new(&mut conn).find_by_provider_order_id(&event.data.entity_id).await?
            };

            match order {
                Some(order) => {
                    // Errors here must still acknowledge the event; the
                    // provider would otherwise retry a payment we have seen.
                    if let Err(err) = fulfil_order(&state, &order).await {
                        tracing::error!(error = %err, order_id = %order.id, "strike fulfilment failed");
                    }
                }
                None => tracing::debug!(entity_id = %event.data.entity_id, "strike event for unknown invoice"),
            }
        }
        other => tracing::debug!(event_type = %other, "ignoring strike event"),
    }

    Ok(Json(json!({ "received": true })).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FourthwallEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: FourthwallOrderData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FourthwallOrderData {
    id: String,
    email: String,
    amount: Option<FourthwallAmount>,
    affiliate_code: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FourthwallAmount {
    value: Decimal,
    currency: String,
}

/// `POST /api/webhooks/fourthwall`
///
/// Merch orders are placed and paid on the Fourthwall storefront; this
/// records them locally and runs affiliate attribution. Recording is
/// idempotent on the provider order id.
#[tracing::instrument(skip_all)]
pub async fn fourthwall(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let event: FourthwallEvent = serde_json::from_slice(&body).map_err(|e| Error::BadRequest {
        message: format!("Invalid webhook body: {e}"),
    })?;

    tracing::info!(event_type = %event.event_type, "received fourthwall webhook");

    if event.event_type == "ORDER_PLACED" {
        if event.data.id.is_empty() || event.data.email.is_empty() {
            return Err(Error::bad_request("Webhook order is missing id or email"));
        }

        let amount = event.data.amount.unwrap_or_default();
        let currency = if amount.currency.is_empty() { "USD".to_string() } else { amount.currency };

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let inserted = Orders::new(&mut conn)
            .create_paid_external(
                &OrderCreateDBRequest {
                    email: event.data.email.trim().to_ascii_lowercase(),
                    provider: PaymentProviderKind::Fourthwall,
                    amount: amount.value,
                    currency,
                    affiliate_code: event.data.affiliate_code.clone(),
                    collection_slug: None,
                },
                &event.data.id,
            )
            .await?;

        match inserted {
            Some(order) => {
                if let Some(code) = &order.affiliate_code {
                    match Affiliates::new(&mut conn).record_purchase(code, &order.email, order.amount).await {
                        Ok(Some(attribution)) => {
                            tracing::info!(affiliate = %attribution.affiliate_code, commission = %attribution.commission, "recorded affiliate purchase");
                        }
                        Ok(None) => tracing::warn!(code = %code, "order carried an unknown affiliate code"),
                        Err(err) => tracing::warn!(error = %err, "affiliate attribution failed"),
                    }
                }
            }
            None => tracing::debug!(provider_order_id = %event.data.id, "fourthwall order already recorded"),
        }
    } else {
        tracing::debug!(event_type = %event.event_type, "ignoring fourthwall event");
    }

    Ok(Json(json!({ "received": true })).into_response())
}
