//! HTTP handlers for the utils endpoints: the entitlement-gated media
//! streaming proxy.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    api::handlers::{split_segment, unknown_endpoint},
    db::{errors::DbError, handlers::entitlements::Entitlements},
    errors::{Error, Result},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StreamParams {
    pub order_id: Option<Uuid>,
}

/// GET dispatch for `/api/utils/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_get(State(state): State<AppState>, Path(path): Path<String>, Query(params): Query<StreamParams>) -> Result<Response> {
    let (segment, rest) = split_segment(&path);
    match segment {
        "stream" => stream_media(state, rest, params).await,
        other => Err(unknown_endpoint("utils", other)),
    }
}

/// `GET /api/utils/stream/{collection}/{file}?order_id=`
///
/// Verifies an unexpired entitlement for the order and collection, then pipes
/// the upstream drive's byte stream straight into the response without
/// buffering. Backpressure is whatever the transport provides.
async fn stream_media(state: AppState, rest: &str, params: StreamParams) -> Result<Response> {
    let Some((collection, file)) = rest.split_once('/').filter(|(c, f)| !c.is_empty() && !f.is_empty()) else {
        return Err(Error::bad_request("Expected stream/{collection}/{file}"));
    };
    let Some(order_id) = params.order_id else {
        return Err(Error::bad_request("order_id is required"));
    };

    let upstream_base = state.config.media.upstream_base_url.as_deref().ok_or_else(|| Error::Configuration {
        message: "Media upstream is not configured".to_string(),
    })?;

    {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Entitlements::new(&mut conn)
            .find_valid(order_id, collection)
            .await?
            .ok_or_else(|| Error::Forbidden {
                message: "No valid entitlement for this collection".to_string(),
            })?;
    }

    let url = format!("{}/{}/{}", upstream_base.trim_end_matches('/'), collection, file);
    let upstream = reqwest::Client::new().get(&url).send().await.map_err(|e| Error::Upstream {
        message: format!("media upstream: {e}"),
    })?;

    if !upstream.status().is_success() {
        return Err(Error::Upstream {
            message: format!("media upstream returned {}", upstream.status()),
        });
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| mime_guess::from_path(file).first_or_octet_stream().to_string());
    let content_length = upstream.content_length();

    let mut response = Response::builder().status(StatusCode::OK).header(header::CONTENT_TYPE, content_type);
    if let Some(length) = content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);
    response.body(Body::from_stream(stream)).map_err(|e| Error::Internal {
        operation: format!("build streaming response: {e}"),
    })
}
