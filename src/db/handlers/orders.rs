//! Database repository for shop orders and photo orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderStatus, PaymentProviderKind},
};
use crate::types::{OrderId, abbrev_uuid};

/// Filter for listing orders
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            skip: 0,
            limit: 100,
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    pub id: Uuid,
    pub email: String,
    pub status: String,
    pub provider: String,
    pub provider_order_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub affiliate_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderDBResponse {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e: anyhow::Error| DbError::Other(e.context("decode orders.status")))?;
        let provider: PaymentProviderKind = row
            .provider
            .parse()
            .map_err(|e: anyhow::Error| DbError::Other(e.context("decode orders.provider")))?;
        Ok(Self {
            id: row.id,
            email: row.email,
            status,
            provider,
            provider_order_id: row.provider_order_id,
            amount: row.amount,
            currency: row.currency,
            affiliate_code: row.affiliate_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, email, status, provider, provider_order_id, amount, currency, affiliate_code, created_at, updated_at";

pub struct Orders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(provider = %request.provider), err)]
    pub async fn create(&mut self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (email, provider, amount, currency, affiliate_code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&request.email)
        .bind(request.provider.as_str())
        .bind(request.amount)
        .bind(&request.currency)
        .bind(&request.affiliate_code)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(collection_slug) = &request.collection_slug {
            sqlx::query("INSERT INTO photo_orders (order_id, collection_slug) VALUES ($1, $2)")
                .bind(row.id)
                .bind(collection_slug)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(OrderDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn find_by_provider_order_id(&mut self, provider_order_id: &str) -> Result<Option<OrderDBResponse>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE provider_order_id = $1"))
            .bind(provider_order_id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(OrderDBResponse::try_from).transpose()
    }

    /// Attach the provider's order/invoice id once the checkout is created.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn set_provider_order_id(&mut self, id: OrderId, provider_order_id: &str) -> Result<()> {
        sqlx::query("UPDATE orders SET provider_order_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(provider_order_id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Mark an order paid. Returns None when the order does not exist or is
    /// already paid - fulfilment is idempotent on that.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_paid(&mut self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = 'paid', updated_at = NOW() WHERE id = $1 AND status <> 'paid' RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(OrderDBResponse::try_from).transpose()
    }

    /// Insert an order that was created and paid entirely on the provider's
    /// side (Fourthwall). Returns None when the provider order id was already
    /// recorded.
    #[instrument(skip(self, request), fields(provider = %request.provider), err)]
    pub async fn create_paid_external(&mut self, request: &OrderCreateDBRequest, provider_order_id: &str) -> Result<Option<OrderDBResponse>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (email, status, provider, provider_order_id, amount, currency, affiliate_code)
            VALUES ($1, 'paid', $2, $3, $4, $5, $6)
            ON CONFLICT (provider_order_id) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&request.email)
        .bind(request.provider.as_str())
        .bind(provider_order_id)
        .bind(request.amount)
        .bind(&request.currency)
        .bind(&request.affiliate_code)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(OrderDBResponse::try_from).transpose()
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &OrderFilter) -> Result<Vec<OrderDBResponse>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        rows.into_iter().map(OrderDBResponse::try_from).collect()
    }

    /// The photo collection attached to an order, if it is a photo order.
    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&order_id)), err)]
    pub async fn photo_collection(&mut self, order_id: OrderId) -> Result<Option<String>> {
        let slug: Option<String> = sqlx::query_scalar("SELECT collection_slug FROM photo_orders WHERE order_id = $1 LIMIT 1")
            .bind(order_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(slug)
    }
}
