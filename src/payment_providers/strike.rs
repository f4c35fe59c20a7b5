//! Strike invoices API adapter.
//!
//! Creating a checkout is invoice + quote: the invoice carries the amount and
//! correlation id, the quote returns the Lightning payment request the client
//! pays. Payment completion arrives via webhook.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::{config::StrikeConfig, errors::Error, payment_providers::CheckoutSession};

pub struct StrikeClient {
    http: reqwest::Client,
    config: StrikeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceResponse {
    invoice_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    ln_invoice: String,
}

impl StrikeClient {
    pub fn new(config: &StrikeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    #[instrument(skip(self), fields(correlation_id = %correlation_id), err)]
    async fn create_invoice(&self, amount: Decimal, currency: &str, description: &str, correlation_id: &str) -> Result<String, Error> {
        let body = json!({
            "correlationId": correlation_id,
            "description": description,
            "amount": {
                "amount": amount.to_string(),
                "currency": currency,
            }
        });

        let response = self
            .http
            .post(format!("{}/v1/invoices", self.base()))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream {
                message: format!("strike create invoice: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                message: format!("strike create invoice returned {}", response.status()),
            });
        }

        let invoice: InvoiceResponse = response.json().await.map_err(|e| Error::Upstream {
            message: format!("strike invoice response: {e}"),
        })?;

        Ok(invoice.invoice_id)
    }

    #[instrument(skip(self), err)]
    async fn create_quote(&self, invoice_id: &str) -> Result<String, Error> {
        let response = self
            .http
            .post(format!("{}/v1/invoices/{}/quote", self.base(), invoice_id))
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| Error::Upstream {
                message: format!("strike create quote: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                message: format!("strike create quote returned {}", response.status()),
            });
        }

        let quote: QuoteResponse = response.json().await.map_err(|e| Error::Upstream {
            message: format!("strike quote response: {e}"),
        })?;

        Ok(quote.ln_invoice)
    }

    /// Invoice + quote in one step; the session's payment_request is the
    /// Lightning invoice the client pays.
    #[instrument(skip(self), fields(correlation_id = %correlation_id), err)]
    pub async fn create_checkout(&self, amount: Decimal, currency: &str, description: &str, correlation_id: &str) -> Result<CheckoutSession, Error> {
        let invoice_id = self.create_invoice(amount, currency, description, correlation_id).await?;
        let ln_invoice = self.create_quote(&invoice_id).await?;

        Ok(CheckoutSession {
            provider_order_id: invoice_id,
            checkout_url: None,
            payment_request: Some(ln_invoice),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StrikeClient {
        StrikeClient::new(&StrikeConfig {
            base_url: server.uri(),
            api_key: "sk-strike-test".to_string(),
            webhook_secret: None,
        })
    }

    #[tokio::test]
    async fn test_create_checkout_invoice_then_quote() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/invoices"))
            .and(header("authorization", "Bearer sk-strike-test"))
            .and(body_string_contains("correlationId"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "invoiceId": "6f7f9d4b-2e43-4c3a-9640-0d8c2b9c63b1",
                "state": "UNPAID"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/invoices/6f7f9d4b-2e43-4c3a-9640-0d8c2b9c63b1/quote"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "quoteId": "b3b7a9c0-1111-2222-3333-444455556666",
                "lnInvoice": "lnbc250u1p3testinvoice"
            })))
            .mount(&server)
            .await;

        let session = client(&server)
            .create_checkout("25.00".parse().unwrap(), "USD", "Photo order", "order-123")
            .await
            .expect("checkout should be created");

        assert_eq!(session.provider_order_id, "6f7f9d4b-2e43-4c3a-9640-0d8c2b9c63b1");
        assert_eq!(session.payment_request.as_deref(), Some("lnbc250u1p3testinvoice"));
        assert!(session.checkout_url.is_none());
    }

    #[tokio::test]
    async fn test_invoice_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/invoices"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_checkout("25.00".parse().unwrap(), "USD", "Photo order", "order-123")
            .await
            .unwrap_err();

        match err {
            Error::Upstream { message } => assert!(message.contains("401")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
