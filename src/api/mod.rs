//! API layer: request/response models and axum route handlers.

pub mod handlers;
pub mod models;
