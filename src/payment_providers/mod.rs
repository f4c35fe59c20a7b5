//! Payment provider adapters.
//!
//! Each provider is a thin REST client over `reqwest`. The shop handlers pick
//! the adapter from the configured [`crate::config::PaymentsConfig`]; an
//! unconfigured provider surfaces as a 501 at the call site.

pub mod paypal;
pub mod strike;

/// What the shop hands back to the client after creating a provider checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// The provider's id for the order/invoice; webhooks and capture
    /// correlate on this.
    pub provider_order_id: String,
    /// Hosted checkout URL (PayPal approval link)
    pub checkout_url: Option<String>,
    /// Lightning payment request (Strike quote)
    pub payment_request: Option<String>,
}
