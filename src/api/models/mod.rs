//! API request/response models, one module per feature area.

pub mod admin;
pub mod affiliates;
pub mod blog;
pub mod newsletter;
pub mod orders;
