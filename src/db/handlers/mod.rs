//! Database repositories, one per entity.
//!
//! Each repository wraps a `PgConnection` and exposes the queries its entity
//! needs. [`repository::Repository`] provides the common CRUD surface for
//! entities that have one; aggregation queries (newsletter logs, site
//! analytics) are free functions over a pool.

pub mod affiliates;
pub mod analytics;
pub mod blog;
pub mod entitlements;
pub mod newsletter;
pub mod orders;
pub mod repository;

pub use repository::Repository;
