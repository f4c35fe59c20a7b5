//! Database repository for blog posts.

use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::blog::{BlogPostCreateDBRequest, BlogPostDBResponse, BlogPostUpdateDBRequest},
};
use crate::types::{PostId, abbrev_uuid};

/// Filter for listing blog posts
#[derive(Debug, Clone)]
pub struct BlogPostFilter {
    /// Only published posts (the public listing)
    pub published_only: bool,
    pub skip: i64,
    pub limit: i64,
}

impl Default for BlogPostFilter {
    fn default() -> Self {
        Self {
            published_only: true,
            skip: 0,
            limit: 50,
        }
    }
}

const POST_COLUMNS: &str = "id, slug, title, body_html, published, created_at, updated_at";

pub struct BlogPosts<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for BlogPosts<'c> {
    type CreateRequest = BlogPostCreateDBRequest;
    type UpdateRequest = BlogPostUpdateDBRequest;
    type Response = BlogPostDBResponse;
    type Id = PostId;
    type Filter = BlogPostFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!(
            r#"
            INSERT INTO blog_posts (slug, title, body_html, published)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&request.slug)
        .bind(&request.title)
        .bind(&request.body_html)
        .bind(request.published)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(post)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(post)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let posts = sqlx::query_as::<_, BlogPostDBResponse>(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(posts.into_iter().map(|post| (post.id, post)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let posts = sqlx::query_as::<_, BlogPostDBResponse>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM blog_posts
            WHERE ($1::bool = FALSE OR published = TRUE)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.published_only)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(posts)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!(
            r#"
            UPDATE blog_posts SET
                title = COALESCE($2, title),
                body_html = COALESCE($3, body_html),
                published = COALESCE($4, published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.title)
        .bind(&request.body_html)
        .bind(request.published)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(post)
    }
}

impl<'c> BlogPosts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Public lookup by slug; only published posts are visible.
    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<BlogPostDBResponse>> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1 AND published = TRUE"
        ))
        .bind(slug)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(post)
    }
}
