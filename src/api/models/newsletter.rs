//! Request/response models for the newsletter endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::newsletter::{SendLogDBResponse, SendLogStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterLogsParams {
    /// Query parameter is camelCase for compatibility with existing clients
    #[serde(rename = "campaignId")]
    pub campaign_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Derived delivery counts over a (possibly filtered) set of send logs.
///
/// `sent + failed + pending <= total`; equality holds when every log carries
/// one of the three canonical statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    pub pending: i64,
}

/// Count delivery statuses in-memory over the fetched rows.
pub fn summarize(logs: &[SendLogDBResponse]) -> LogSummary {
    let mut summary = LogSummary {
        total: logs.len() as i64,
        ..Default::default()
    };

    for log in logs {
        match log.status.parse::<SendLogStatus>() {
            Ok(SendLogStatus::Sent) => summary.sent += 1,
            Ok(SendLogStatus::Failed) => summary.failed += 1,
            Ok(SendLogStatus::Pending) => summary.pending += 1,
            // Unknown statuses count toward total only
            Err(_) => {}
        }
    }

    summary
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsletterLogsResponse {
    pub success: bool,
    pub logs: Vec<SendLogDBResponse>,
    pub summary: LogSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmParams {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendCampaignRequest {
    pub subject: String,
    pub body_html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendCampaignResponse {
    pub success: bool,
    pub campaign_id: Uuid,
    pub summary: LogSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log(status: &str) -> SendLogDBResponse {
        SendLogDBResponse {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            subscriber_email: "sub@example.com".to_string(),
            status: status.to_string(),
            error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), LogSummary::default());
    }

    #[test]
    fn test_summarize_counts_canonical_statuses() {
        let logs = vec![log("sent"), log("sent"), log("failed"), log("pending")];
        let summary = summarize(&logs);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.sent + summary.failed + summary.pending, summary.total);
    }

    #[test]
    fn test_summarize_tolerates_unknown_status() {
        let logs = vec![log("sent"), log("bounced"), log("pending")];
        let summary = summarize(&logs);
        assert_eq!(summary.total, 3);
        // Unknown statuses keep the invariant an inequality
        assert!(summary.sent + summary.failed + summary.pending <= summary.total);
        assert_eq!(summary.sent + summary.failed + summary.pending, 2);
    }
}
