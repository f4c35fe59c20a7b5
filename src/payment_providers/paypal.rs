//! PayPal Orders API adapter.
//!
//! Two-step flow: a client-credentials token, then order create/capture
//! against `/v2/checkout/orders`. The approval link returned on create is the
//! hosted checkout URL the frontend redirects to.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::{config::PayPalConfig, errors::Error, payment_providers::CheckoutSession};

pub struct PayPalClient {
    http: reqwest::Client,
    config: PayPalConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<OrderLink>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    #[instrument(skip(self), err)]
    async fn access_token(&self) -> Result<String, Error> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base()))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Upstream {
                message: format!("paypal token request: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                message: format!("paypal token request returned {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| Error::Upstream {
            message: format!("paypal token response: {e}"),
        })?;

        Ok(token.access_token)
    }

    /// Create an order and return the provider id plus the approval link.
    #[instrument(skip(self), fields(reference_id = %reference_id), err)]
    pub async fn create_order(&self, amount: Decimal, currency: &str, reference_id: &str) -> Result<CheckoutSession, Error> {
        let token = self.access_token().await?;

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference_id,
                "amount": {
                    "currency_code": currency,
                    "value": amount.to_string(),
                }
            }]
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base()))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream {
                message: format!("paypal create order: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                message: format!("paypal create order returned {}", response.status()),
            });
        }

        let order: OrderResponse = response.json().await.map_err(|e| Error::Upstream {
            message: format!("paypal create order response: {e}"),
        })?;

        let checkout_url = order.links.iter().find(|link| link.rel == "approve").map(|link| link.href.clone());

        Ok(CheckoutSession {
            provider_order_id: order.id,
            checkout_url,
            payment_request: None,
        })
    }

    /// Capture an approved order. Returns true when the capture completed.
    #[instrument(skip(self), err)]
    pub async fn capture_order(&self, provider_order_id: &str) -> Result<bool, Error> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders/{}/capture", self.base(), provider_order_id))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| Error::Upstream {
                message: format!("paypal capture: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                message: format!("paypal capture returned {}", response.status()),
            });
        }

        let capture: CaptureResponse = response.json().await.map_err(|e| Error::Upstream {
            message: format!("paypal capture response: {e}"),
        })?;

        Ok(capture.status == "COMPLETED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PayPalClient {
        PayPalClient::new(&PayPalConfig {
            base_url: server.uri(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
        })
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A21AAtest",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_order_returns_approval_link() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .and(body_string_contains("CAPTURE"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "5O190127TN364715T",
                "status": "CREATED",
                "links": [
                    {"href": "https://api-m.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self", "method": "GET"},
                    {"href": "https://www.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve", "method": "GET"}
                ]
            })))
            .mount(&server)
            .await;

        let session = client(&server)
            .create_order("25.00".parse().unwrap(), "USD", "order-ref")
            .await
            .expect("order should be created");

        assert_eq!(session.provider_order_id, "5O190127TN364715T");
        assert_eq!(
            session.checkout_url.as_deref(),
            Some("https://www.paypal.com/checkoutnow?token=5O190127TN364715T")
        );
        assert!(session.payment_request.is_none());
    }

    #[tokio::test]
    async fn test_capture_completed() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders/5O190127TN364715T/capture"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "5O190127TN364715T",
                "status": "COMPLETED"
            })))
            .mount(&server)
            .await;

        let completed = client(&server).capture_order("5O190127TN364715T").await.unwrap();
        assert!(completed);
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_order("25.00".parse().unwrap(), "USD", "order-ref")
            .await
            .unwrap_err();

        match err {
            Error::Upstream { message } => assert!(message.contains("500")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
