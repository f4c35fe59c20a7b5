//! Database repository for newsletter subscribers, campaigns and send logs.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    models::newsletter::{
        CampaignCreateDBRequest, CampaignDBResponse, SendLogDBResponse, SendLogStatus, SubscriberDBResponse, SubscriberStatus,
    },
};
use crate::types::{CampaignId, abbrev_uuid};

#[derive(Debug, Clone, FromRow)]
struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub status: String,
    pub confirmation_token: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for SubscriberDBResponse {
    type Error = DbError;

    fn try_from(row: SubscriberRow) -> Result<Self> {
        let status: SubscriberStatus = row
            .status
            .parse()
            .map_err(|e: anyhow::Error| DbError::Other(e.context("decode newsletter_subscribers.status")))?;
        Ok(Self {
            id: row.id,
            email: row.email,
            status,
            confirmation_token: row.confirmation_token,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct CampaignRow {
    pub id: Uuid,
    pub subject: String,
    pub body_html: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<CampaignRow> for CampaignDBResponse {
    fn from(row: CampaignRow) -> Self {
        Self {
            id: row.id,
            subject: row.subject,
            body_html: row.body_html,
            created_at: row.created_at,
            sent_at: row.sent_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct SendLogRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub subscriber_email: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SendLogRow> for SendLogDBResponse {
    fn from(row: SendLogRow) -> Self {
        Self {
            id: row.id,
            campaign_id: row.campaign_id,
            subscriber_email: row.subscriber_email,
            status: row.status,
            error: row.error,
            created_at: row.created_at,
        }
    }
}

pub struct Newsletter<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Newsletter<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Register (or re-register) a subscriber as pending with a fresh
    /// confirmation token. An already-confirmed subscriber stays confirmed;
    /// an unsubscribed one goes back to pending.
    #[instrument(skip(self, token), err)]
    pub async fn upsert_pending(&mut self, email: &str, token: &str) -> Result<SubscriberDBResponse> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            INSERT INTO newsletter_subscribers (email, status, confirmation_token)
            VALUES ($1, 'pending', $2)
            ON CONFLICT (email) DO UPDATE SET
                confirmation_token = EXCLUDED.confirmation_token,
                status = CASE
                    WHEN newsletter_subscribers.status = 'confirmed' THEN 'confirmed'
                    ELSE 'pending'
                END
            RETURNING id, email, status, confirmation_token, created_at
            "#,
        )
        .bind(email)
        .bind(token)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }

    /// Confirm the subscriber holding `token`. None when the token is unknown.
    #[instrument(skip(self, token), err)]
    pub async fn confirm_by_token(&mut self, token: &str) -> Result<Option<SubscriberDBResponse>> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            UPDATE newsletter_subscribers SET status = 'confirmed'
            WHERE confirmation_token = $1
            RETURNING id, email, status, confirmation_token, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(SubscriberDBResponse::try_from).transpose()
    }

    /// Unsubscribe by email. Missing rows collapse to success (idempotent).
    #[instrument(skip(self), err)]
    pub async fn unsubscribe(&mut self, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE newsletter_subscribers SET status = 'unsubscribed' WHERE email = $1")
            .bind(email)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    pub async fn list_confirmed(&mut self) -> Result<Vec<SubscriberDBResponse>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, status, confirmation_token, created_at
             FROM newsletter_subscribers WHERE status = 'confirmed' ORDER BY created_at",
        )
        .fetch_all(&mut *self.db)
        .await?;

        rows.into_iter().map(SubscriberDBResponse::try_from).collect()
    }

    #[instrument(skip(self, request), err)]
    pub async fn create_campaign(&mut self, request: &CampaignCreateDBRequest) -> Result<CampaignDBResponse> {
        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            INSERT INTO newsletter_campaigns (subject, body_html)
            VALUES ($1, $2)
            RETURNING id, subject, body_html, created_at, sent_at
            "#,
        )
        .bind(&request.subject)
        .bind(&request.body_html)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(campaign_id = %abbrev_uuid(&campaign_id)), err)]
    pub async fn mark_campaign_sent(&mut self, campaign_id: CampaignId) -> Result<()> {
        sqlx::query("UPDATE newsletter_campaigns SET sent_at = NOW() WHERE id = $1")
            .bind(campaign_id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, error), fields(campaign_id = %abbrev_uuid(&campaign_id), status = %status), err)]
    pub async fn insert_send_log(
        &mut self,
        campaign_id: CampaignId,
        subscriber_email: &str,
        status: SendLogStatus,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO newsletter_send_logs (campaign_id, subscriber_email, status, error) VALUES ($1, $2, $3, $4)")
            .bind(campaign_id)
            .bind(subscriber_email)
            .bind(status.as_str())
            .bind(error)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}

/// Fetch a campaign's send logs ordered by creation time ascending, with an
/// optional status filter. The summary over the result set is derived
/// in-memory by the handler.
#[instrument(skip(db), fields(campaign_id = %abbrev_uuid(&campaign_id)), err)]
pub async fn logs_for_campaign(db: &PgPool, campaign_id: CampaignId, status: Option<&str>) -> Result<Vec<SendLogDBResponse>> {
    let rows = sqlx::query_as::<_, SendLogRow>(
        r#"
        SELECT id, campaign_id, subscriber_email, status, error, created_at
        FROM newsletter_send_logs
        WHERE campaign_id = $1
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at ASC
        "#,
    )
    .bind(campaign_id)
    .bind(status)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(SendLogDBResponse::from).collect())
}
