//! Database repository for media entitlements.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{errors::Result, models::entitlements::EntitlementDBResponse};
use crate::types::{OrderId, abbrev_uuid};

pub struct Entitlements<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Entitlements<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Grant access to a collection for `ttl_hours` from now.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&order_id)), err)]
    pub async fn grant(&mut self, order_id: OrderId, collection_slug: &str, ttl_hours: i64) -> Result<EntitlementDBResponse> {
        let entitlement = sqlx::query_as::<_, EntitlementDBResponse>(
            r#"
            INSERT INTO entitlements (order_id, collection_slug, expires_at)
            VALUES ($1, $2, NOW() + make_interval(hours => $3::int))
            RETURNING id, order_id, collection_slug, expires_at, created_at
            "#,
        )
        .bind(order_id)
        .bind(collection_slug)
        .bind(ttl_hours)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entitlement)
    }

    /// Find an unexpired entitlement for the order and collection.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&order_id)), err)]
    pub async fn find_valid(&mut self, order_id: OrderId, collection_slug: &str) -> Result<Option<EntitlementDBResponse>> {
        let entitlement = sqlx::query_as::<_, EntitlementDBResponse>(
            r#"
            SELECT id, order_id, collection_slug, expires_at, created_at
            FROM entitlements
            WHERE order_id = $1 AND collection_slug = $2 AND expires_at > NOW()
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .bind(collection_slug)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(entitlement)
    }

    /// Reset the expiry of all of an order's entitlements to now + `hours`.
    /// Last write wins; returns the number of rows touched.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&order_id)), err)]
    pub async fn extend_expiry(&mut self, order_id: OrderId, hours: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE entitlements SET expires_at = NOW() + make_interval(hours => $2::int) WHERE order_id = $1")
            .bind(order_id)
            .bind(hours)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
