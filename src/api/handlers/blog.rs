//! HTTP handlers for the blog endpoints.

use bytes::Bytes;
use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::handlers::{admin::require_admin, parse_json_body, split_segment, unknown_endpoint},
    api::models::blog::{CreatePostRequest, PostResponse, PostsResponse},
    db::{
        errors::DbError,
        handlers::{
            Repository,
            blog::{BlogPostFilter, BlogPosts},
        },
        models::blog::BlogPostCreateDBRequest,
    },
    errors::{Error, Result},
};

/// GET dispatch for `/api/blog/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_get(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let (segment, rest) = split_segment(&path);
    match (segment, rest) {
        ("posts", "") => list_posts(state).await,
        ("posts", slug) => get_post(state, slug).await,
        (other, _) => Err(unknown_endpoint("blog", other)),
    }
}

/// POST dispatch for `/api/blog/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_post(State(state): State<AppState>, Path(path): Path<String>, headers: HeaderMap, body: Bytes) -> Result<Response> {
    let (segment, rest) = split_segment(&path);
    match (segment, rest) {
        ("posts", "") => create_post(state, &headers, &body).await,
        (other, _) => Err(unknown_endpoint("blog", other)),
    }
}

/// `GET /api/blog/posts` - published posts, newest first
async fn list_posts(state: AppState) -> Result<Response> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let posts = BlogPosts::new(&mut conn).list(&BlogPostFilter::default()).await?;

    Ok(Json(PostsResponse { success: true, posts }).into_response())
}

/// `GET /api/blog/posts/{slug}`
async fn get_post(state: AppState, slug: &str) -> Result<Response> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let post = BlogPosts::new(&mut conn).get_by_slug(slug).await?.ok_or_else(|| Error::NotFound {
        resource: "blog post".to_string(),
        id: slug.to_string(),
    })?;

    Ok(Json(PostResponse { success: true, post }).into_response())
}

/// `POST /api/blog/posts` (admin)
async fn create_post(state: AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response> {
    require_admin(&state, headers)?;

    let request: CreatePostRequest = parse_json_body(body)?;
    if request.slug.trim().is_empty() || request.title.trim().is_empty() {
        return Err(Error::bad_request("slug and title are required"));
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let post = BlogPosts::new(&mut conn)
        .create(&BlogPostCreateDBRequest {
            slug: request.slug.trim().to_string(),
            title: request.title,
            body_html: request.body_html,
            published: request.published,
        })
        .await?;

    Ok(Json(PostResponse { success: true, post }).into_response())
}
