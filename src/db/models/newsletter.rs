//! Newsletter subscriber, campaign and send-log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::{CampaignId, SubscriberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Pending,
    Confirmed,
    Unsubscribed,
}

impl SubscriberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Pending => "pending",
            SubscriberStatus::Confirmed => "confirmed",
            SubscriberStatus::Unsubscribed => "unsubscribed",
        }
    }
}

impl FromStr for SubscriberStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriberStatus::Pending),
            "confirmed" => Ok(SubscriberStatus::Confirmed),
            "unsubscribed" => Ok(SubscriberStatus::Unsubscribed),
            other => Err(anyhow::anyhow!("unknown subscriber status: {other}")),
        }
    }
}

/// Delivery status of one campaign mail to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendLogStatus {
    Sent,
    Failed,
    Pending,
}

impl SendLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendLogStatus::Sent => "sent",
            SendLogStatus::Failed => "failed",
            SendLogStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for SendLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendLogStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(SendLogStatus::Sent),
            "failed" => Ok(SendLogStatus::Failed),
            "pending" => Ok(SendLogStatus::Pending),
            other => Err(anyhow::anyhow!("unknown send log status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriberDBResponse {
    pub id: SubscriberId,
    pub email: String,
    pub status: SubscriberStatus,
    pub confirmation_token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDBResponse {
    pub id: CampaignId,
    pub subject: String,
    pub body_html: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CampaignCreateDBRequest {
    pub subject: String,
    pub body_html: String,
}

/// One row per subscriber per campaign. The raw `status` string is kept as
/// stored; summary counting tolerates values outside the canonical three.
#[derive(Debug, Clone, Serialize)]
pub struct SendLogDBResponse {
    pub id: Uuid,
    pub campaign_id: CampaignId,
    pub subscriber_email: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
