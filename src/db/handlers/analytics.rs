//! Database queries for site analytics.
//!
//! The `site_analytics` table is provisioned by an out-of-band importer and
//! may not exist at all. Callers special-case [`DbError::UndefinedTable`] to
//! degrade to an empty result instead of failing the request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use crate::db::errors::Result;

/// One analytics metric row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnalyticsEntry {
    pub metric: String,
    pub value: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Most recent site analytics entries, newest first.
#[instrument(skip(db), err)]
pub async fn site_stats(db: &PgPool) -> Result<Vec<AnalyticsEntry>> {
    let rows = sqlx::query_as::<_, AnalyticsEntry>(
        "SELECT metric, value, recorded_at FROM site_analytics ORDER BY recorded_at DESC LIMIT 100",
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}
