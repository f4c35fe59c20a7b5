//! Database layer: error categorization, entity models, and repositories.

pub mod errors;
pub mod handlers;
pub mod models;
