//! Database request/response models, one module per entity.

pub mod affiliates;
pub mod blog;
pub mod entitlements;
pub mod newsletter;
pub mod orders;
