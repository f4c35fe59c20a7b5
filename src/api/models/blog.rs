//! Request/response models for the blog endpoints.

use serde::{Deserialize, Serialize};

use crate::db::models::blog::BlogPostDBResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub slug: String,
    pub title: String,
    pub body_html: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsResponse {
    pub success: bool,
    pub posts: Vec<BlogPostDBResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: BlogPostDBResponse,
}
