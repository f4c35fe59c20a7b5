//! Blog post models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::PostId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BlogPostDBResponse {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub body_html: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlogPostCreateDBRequest {
    pub slug: String,
    pub title: String,
    pub body_html: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlogPostUpdateDBRequest {
    pub title: Option<String>,
    pub body_html: Option<String>,
    pub published: Option<bool>,
}
