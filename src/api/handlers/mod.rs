//! HTTP request handlers for all API endpoints.
//!
//! Flat routes cover the affiliate lookup, the newsletter log aggregation and
//! the payment webhooks. The per-area catch-all routes (`admin/*`, `blog/*`,
//! `newsletter/*`, `shop/*`, `utils/*`) dispatch on the first path segment of
//! the wildcard capture; an unrecognized segment yields a 404 JSON body that
//! names the segment.
//!
//! # Handler Modules
//!
//! - [`admin`]: site analytics, order listing, affiliate creation
//! - [`affiliates`]: customer-affiliate lookup, click tracking, stats
//! - [`blog`]: published post listing and lookup, post creation
//! - [`newsletter`]: subscribe/confirm/unsubscribe, campaign send, send logs
//! - [`shop`]: order creation and capture against the payment providers
//! - [`utils`]: entitlement-gated media streaming proxy
//! - [`webhooks`]: Strike and Fourthwall payment webhooks
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts into a JSON
//! `{"error": ...}` body with the appropriate status code.

pub mod admin;
pub mod affiliates;
pub mod blog;
pub mod newsletter;
pub mod shop;
pub mod utils;
pub mod webhooks;

use crate::errors::Error;

/// Split a catch-all capture into its first segment and the remainder.
pub(crate) fn split_segment(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    match path.split_once('/') {
        Some((segment, rest)) => (segment, rest),
        None => (path, ""),
    }
}

/// 404 for an unrecognized first path segment under a catch-all route.
/// The body names the segment so misrouted clients can see what they sent.
pub(crate) fn unknown_endpoint(area: &str, segment: &str) -> Error {
    Error::NotFound {
        resource: format!("{area} endpoint"),
        id: segment.to_string(),
    }
}

/// Parse a JSON request body, mapping malformed input to a 400.
pub(crate) fn parse_json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {e}"),
    })
}

/// Minimal shape check used everywhere an email address is accepted.
pub(crate) fn validate_email(email: &str) -> Result<(), Error> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.len() > 320 {
        return Err(Error::bad_request("A valid email address is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segment() {
        assert_eq!(split_segment("analytics/stats"), ("analytics", "stats"));
        assert_eq!(split_segment("orders"), ("orders", ""));
        assert_eq!(split_segment("/orders/abc/capture"), ("orders", "abc/capture"));
        assert_eq!(split_segment(""), ("", ""));
    }

    #[test]
    fn test_unknown_endpoint_names_segment() {
        let err = unknown_endpoint("admin", "frobnicate");
        assert!(err.user_message().contains("frobnicate"));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email(&format!("{}@b.com", "x".repeat(330))).is_err());
    }
}
