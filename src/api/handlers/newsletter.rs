//! HTTP handlers for the newsletter endpoints.
//!
//! The flat `/api/newsletter-logs` route serves the delivery log aggregation;
//! the `/api/newsletter/{*path}` catch-all dispatches subscribe, confirm,
//! unsubscribe and the admin campaign send.

use bytes::Bytes;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    api::handlers::{admin::require_admin, parse_json_body, split_segment, unknown_endpoint, validate_email},
    api::models::newsletter::{
        ConfirmParams, NewsletterLogsParams, NewsletterLogsResponse, SendCampaignRequest, SendCampaignResponse, SubscribeRequest,
        UnsubscribeRequest, summarize,
    },
    crypto,
    db::{
        errors::DbError,
        handlers::newsletter::{Newsletter, logs_for_campaign},
        models::newsletter::{CampaignCreateDBRequest, SendLogStatus},
    },
    email::EmailService,
    errors::{Error, Result},
};

/// `GET /api/newsletter-logs?campaignId=&status=`
///
/// Fetches the campaign's send logs ordered by creation time ascending and
/// derives the in-memory delivery summary over the (possibly filtered) set.
#[tracing::instrument(skip_all)]
pub async fn newsletter_logs(State(state): State<AppState>, Query(params): Query<NewsletterLogsParams>) -> Result<Json<NewsletterLogsResponse>> {
    let Some(campaign_id) = params.campaign_id else {
        return Err(Error::bad_request("campaignId is required"));
    };

    let logs = logs_for_campaign(&state.db, campaign_id, params.status.as_deref()).await?;
    let summary = summarize(&logs);

    Ok(Json(NewsletterLogsResponse {
        success: true,
        logs,
        summary,
    }))
}

/// GET dispatch for `/api/newsletter/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_get(State(state): State<AppState>, Path(path): Path<String>, Query(params): Query<ConfirmParams>) -> Result<Response> {
    let (segment, _rest) = split_segment(&path);
    match segment {
        "confirm" => confirm(state, params).await,
        other => Err(unknown_endpoint("newsletter", other)),
    }
}

/// POST dispatch for `/api/newsletter/{*path}`
#[tracing::instrument(skip_all, fields(path = %path))]
pub async fn dispatch_post(State(state): State<AppState>, Path(path): Path<String>, headers: HeaderMap, body: Bytes) -> Result<Response> {
    let (segment, _rest) = split_segment(&path);
    match segment {
        "subscribe" => subscribe(state, &body).await,
        "unsubscribe" => unsubscribe(state, &body).await,
        "send" => send_campaign(state, &headers, &body).await,
        other => Err(unknown_endpoint("newsletter", other)),
    }
}

async fn subscribe(state: AppState, body: &[u8]) -> Result<Response> {
    let request: SubscribeRequest = parse_json_body(body)?;
    validate_email(&request.email)?;
    let email = request.email.trim().to_ascii_lowercase();

    let token = crypto::generate_token();
    let subscriber = {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Newsletter::new(&mut conn).upsert_pending(&email, &token).await?
    };

    // Confirmation mail is best effort; the subscription row already exists
    // and a re-subscribe issues a fresh token.
    match EmailService::new(&state.config) {
        Ok(service) => {
            if let Err(err) = service.send_subscription_confirmation(&subscriber.email, &subscriber.confirmation_token).await {
                tracing::warn!(error = %err, "confirmation email failed");
            }
        }
        Err(err) => tracing::warn!(error = %err, "email service unavailable"),
    }

    Ok(Json(json!({ "success": true })).into_response())
}

async fn confirm(state: AppState, params: ConfirmParams) -> Result<Response> {
    let Some(token) = params.token.filter(|token| !token.is_empty()) else {
        return Err(Error::bad_request("token is required"));
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let subscriber = Newsletter::new(&mut conn)
        .confirm_by_token(&token)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "subscription token".to_string(),
            id: token.clone(),
        })?;

    Ok(Json(json!({ "success": true, "email": subscriber.email })).into_response())
}

async fn unsubscribe(state: AppState, body: &[u8]) -> Result<Response> {
    let request: UnsubscribeRequest = parse_json_body(body)?;
    validate_email(&request.email)?;
    let email = request.email.trim().to_ascii_lowercase();

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    // Unknown addresses collapse to success: unsubscribing twice is fine
    Newsletter::new(&mut conn).unsubscribe(&email).await?;

    Ok(Json(json!({ "success": true })).into_response())
}

/// Create a campaign and deliver it to every confirmed subscriber, writing
/// one send-log row per subscriber. A failed send is recorded and does not
/// abort the campaign.
async fn send_campaign(state: AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response> {
    require_admin(&state, headers)?;

    let request: SendCampaignRequest = parse_json_body(body)?;
    if request.subject.trim().is_empty() {
        return Err(Error::bad_request("subject is required"));
    }

    let service = EmailService::new(&state.config)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut repo = Newsletter::new(&mut conn);

    let campaign = repo
        .create_campaign(&CampaignCreateDBRequest {
            subject: request.subject.clone(),
            body_html: request.body_html.clone(),
        })
        .await?;

    let subscribers = repo.list_confirmed().await?;

    let mut sent = 0i64;
    let mut failed = 0i64;
    for subscriber in &subscribers {
        match service.send_campaign_email(&subscriber.email, &request.subject, &request.body_html).await {
            Ok(()) => {
                sent += 1;
                repo.insert_send_log(campaign.id, &subscriber.email, SendLogStatus::Sent, None).await?;
            }
            Err(err) => {
                failed += 1;
                tracing::warn!(error = %err, email = %subscriber.email, "campaign send failed");
                repo.insert_send_log(campaign.id, &subscriber.email, SendLogStatus::Failed, Some(&err.to_string()))
                    .await?;
            }
        }
    }

    repo.mark_campaign_sent(campaign.id).await?;

    tracing::info!(campaign_id = %campaign.id, sent, failed, "campaign delivered");

    Ok(Json(SendCampaignResponse {
        success: true,
        campaign_id: campaign.id,
        summary: crate::api::models::newsletter::LogSummary {
            total: sent + failed,
            sent,
            failed,
            pending: 0,
        },
    })
    .into_response())
}
