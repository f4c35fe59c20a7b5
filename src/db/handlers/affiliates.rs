//! Database repository for affiliates and their customer linkage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    models::affiliates::{
        AffiliateCreateDBRequest, AffiliateDBResponse, AffiliateStatsDBResponse, CommissionMode, CustomerLinkDBResponse,
        PurchaseAttribution, commission_for,
    },
};

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct AffiliateRow {
    pub id: Uuid,
    pub affiliate_code: String,
    pub email: String,
    pub commission_mode: String,
    pub commission_rate: Decimal,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AffiliateRow> for AffiliateDBResponse {
    type Error = DbError;

    fn try_from(row: AffiliateRow) -> Result<Self> {
        let commission_mode: CommissionMode = row
            .commission_mode
            .parse()
            .map_err(|e: anyhow::Error| DbError::Other(e.context("decode affiliates.commission_mode")))?;
        Ok(Self {
            id: row.id,
            affiliate_code: row.affiliate_code,
            email: row.email,
            commission_mode,
            commission_rate: row.commission_rate,
            click_count: row.click_count,
            created_at: row.created_at,
        })
    }
}

/// Joined row for the customer-affiliate lookup
#[derive(Debug, Clone, FromRow)]
struct CustomerLinkRow {
    pub customer_email: Option<String>,
    pub customer_user_id: Option<Uuid>,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub purchase_count: i64,
    pub total_profit: Decimal,
    pub affiliate_id: Uuid,
    pub affiliate_code: String,
    pub affiliate_email: String,
    pub commission_mode: String,
    pub commission_rate: Decimal,
    pub click_count: i64,
    pub affiliate_created_at: DateTime<Utc>,
}

impl TryFrom<CustomerLinkRow> for CustomerLinkDBResponse {
    type Error = DbError;

    fn try_from(row: CustomerLinkRow) -> Result<Self> {
        let commission_mode: CommissionMode = row
            .commission_mode
            .parse()
            .map_err(|e: anyhow::Error| DbError::Other(e.context("decode affiliates.commission_mode")))?;
        Ok(Self {
            customer_email: row.customer_email,
            customer_user_id: row.customer_user_id,
            first_purchase_at: row.first_purchase_at,
            purchase_count: row.purchase_count,
            total_profit: row.total_profit,
            affiliate: AffiliateDBResponse {
                id: row.affiliate_id,
                affiliate_code: row.affiliate_code,
                email: row.affiliate_email,
                commission_mode,
                commission_rate: row.commission_rate,
                click_count: row.click_count,
                created_at: row.affiliate_created_at,
            },
        })
    }
}

pub struct Affiliates<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Affiliates<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(code = %request.affiliate_code), err)]
    pub async fn create(&mut self, request: &AffiliateCreateDBRequest) -> Result<AffiliateDBResponse> {
        let row = sqlx::query_as::<_, AffiliateRow>(
            r#"
            INSERT INTO affiliates (affiliate_code, email, commission_mode, commission_rate)
            VALUES ($1, $2, $3, $4)
            RETURNING id, affiliate_code, email, commission_mode, commission_rate, click_count, created_at
            "#,
        )
        .bind(&request.affiliate_code)
        .bind(&request.email)
        .bind(request.commission_mode.as_str())
        .bind(request.commission_rate)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_code(&mut self, code: &str) -> Result<Option<AffiliateDBResponse>> {
        let row = sqlx::query_as::<_, AffiliateRow>(
            "SELECT id, affiliate_code, email, commission_mode, commission_rate, click_count, created_at
             FROM affiliates WHERE affiliate_code = $1",
        )
        .bind(code)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(AffiliateDBResponse::try_from).transpose()
    }

    /// Look up the affiliate linkage for a customer by email and/or user id.
    /// At least one of the two must be provided by the caller.
    #[instrument(skip(self), err)]
    pub async fn find_customer(&mut self, email: Option<&str>, user_id: Option<Uuid>) -> Result<Option<CustomerLinkDBResponse>> {
        let row = sqlx::query_as::<_, CustomerLinkRow>(
            r#"
            SELECT
                ac.customer_email,
                ac.customer_user_id,
                ac.first_purchase_at,
                ac.purchase_count,
                ac.total_profit,
                a.id AS affiliate_id,
                a.affiliate_code,
                a.email AS affiliate_email,
                a.commission_mode,
                a.commission_rate,
                a.click_count,
                a.created_at AS affiliate_created_at
            FROM affiliate_customers ac
            JOIN affiliates a ON a.id = ac.affiliate_id
            WHERE ($1::text IS NULL OR ac.customer_email = $1)
              AND ($2::uuid IS NULL OR ac.customer_user_id = $2)
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(CustomerLinkDBResponse::try_from).transpose()
    }

    /// Count a referral-link click against the affiliate code.
    /// Returns false when the code is unknown.
    #[instrument(skip(self), err)]
    pub async fn record_click(&mut self, code: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE affiliates SET click_count = click_count + 1 WHERE affiliate_code = $1")
            .bind(code)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record an attributed purchase for the customer referred with `code`.
    ///
    /// Upserts the affiliate_customers row (first purchase date, cumulative
    /// count and profit) and computes the commission owed. If the customer is
    /// already linked to a different affiliate, the original linkage wins and
    /// the commission goes to that affiliate. Returns None when the code is
    /// unknown.
    #[instrument(skip(self), fields(code = %code, email = %customer_email), err)]
    pub async fn record_purchase(&mut self, code: &str, customer_email: &str, profit: Decimal) -> Result<Option<PurchaseAttribution>> {
        let mut tx = self.db.begin().await?;

        let affiliate = sqlx::query_as::<_, AffiliateRow>(
            "SELECT id, affiliate_code, email, commission_mode, commission_rate, click_count, created_at
             FROM affiliates WHERE affiliate_code = $1",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(affiliate) = affiliate else {
            return Ok(None);
        };
        let affiliate = AffiliateDBResponse::try_from(affiliate)?;

        #[derive(FromRow)]
        struct UpsertRow {
            affiliate_id: Uuid,
            purchase_count: i64,
        }

        let upserted = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO affiliate_customers (affiliate_id, customer_email, first_purchase_at, purchase_count, total_profit)
            VALUES ($1, $2, NOW(), 1, $3)
            ON CONFLICT (customer_email) WHERE customer_email IS NOT NULL
            DO UPDATE SET
                purchase_count = affiliate_customers.purchase_count + 1,
                total_profit = affiliate_customers.total_profit + EXCLUDED.total_profit,
                first_purchase_at = COALESCE(affiliate_customers.first_purchase_at, NOW())
            RETURNING affiliate_id, purchase_count
            "#,
        )
        .bind(affiliate.id)
        .bind(customer_email)
        .bind(profit)
        .fetch_one(&mut *tx)
        .await?;

        // The linkage may belong to the affiliate that referred this customer
        // first; commission follows the linkage, not the code on the order.
        let owning = if upserted.affiliate_id == affiliate.id {
            affiliate
        } else {
            let row = sqlx::query_as::<_, AffiliateRow>(
                "SELECT id, affiliate_code, email, commission_mode, commission_rate, click_count, created_at
                 FROM affiliates WHERE id = $1",
            )
            .bind(upserted.affiliate_id)
            .fetch_one(&mut *tx)
            .await?;
            AffiliateDBResponse::try_from(row)?
        };

        tx.commit().await?;

        let commission = commission_for(owning.commission_mode, owning.commission_rate, upserted.purchase_count, profit);

        Ok(Some(PurchaseAttribution {
            affiliate_id: owning.id,
            affiliate_code: owning.affiliate_code,
            purchase_count: upserted.purchase_count,
            commission,
        }))
    }

    /// Aggregated totals for one affiliate. None when the code is unknown.
    #[instrument(skip(self), err)]
    pub async fn stats(&mut self, code: &str) -> Result<Option<AffiliateStatsDBResponse>> {
        #[derive(FromRow)]
        struct StatsRow {
            affiliate_code: String,
            clicks: i64,
            customers: i64,
            purchases: i64,
            total_profit: Decimal,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                a.affiliate_code,
                a.click_count AS clicks,
                COUNT(ac.id) AS customers,
                COALESCE(SUM(ac.purchase_count), 0)::bigint AS purchases,
                COALESCE(SUM(ac.total_profit), 0) AS total_profit
            FROM affiliates a
            LEFT JOIN affiliate_customers ac ON ac.affiliate_id = a.id
            WHERE a.affiliate_code = $1
            GROUP BY a.id
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row.map(|row| AffiliateStatsDBResponse {
            affiliate_code: row.affiliate_code,
            clicks: row.clicks,
            customers: row.customers,
            purchases: row.purchases,
            total_profit: row.total_profit,
        }))
    }
}
