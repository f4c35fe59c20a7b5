//! HTTP handlers for the affiliate endpoints.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    api::models::affiliates::{
        AffiliateStatsParams, AffiliateStatsResponse, CheckCustomerParams, CheckCustomerResponse, TrackClickParams, TrackClickResponse,
    },
    db::{errors::DbError, handlers::affiliates::Affiliates},
    errors::{Error, Result},
};

/// `GET /api/affiliates/check-customer?email=|user_id=`
///
/// Resolves whether the customer is linked to a referring affiliate. At least
/// one of `email` or `user_id` is required. A missing linkage and a failed
/// lookup both produce `found: false` - see
/// [`CheckCustomerResponse::from_lookup`].
#[tracing::instrument(skip_all)]
pub async fn check_customer(State(state): State<AppState>, Query(params): Query<CheckCustomerParams>) -> Result<Json<CheckCustomerResponse>> {
    if params.email.is_none() && params.user_id.is_none() {
        return Err(Error::bad_request("Either email or user_id is required"));
    }

    let outcome = async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Affiliates::new(&mut conn).find_customer(params.email.as_deref(), params.user_id).await
    }
    .await;

    Ok(Json(CheckCustomerResponse::from_lookup(outcome)))
}

/// `POST /api/affiliates/track-click?code=`
///
/// Counts a referral-link click. Unknown codes and failed updates collapse to
/// `found: false`, matching the lookup contract.
#[tracing::instrument(skip_all)]
pub async fn track_click(State(state): State<AppState>, Query(params): Query<TrackClickParams>) -> Result<Json<TrackClickResponse>> {
    let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
        return Err(Error::bad_request("code is required"));
    };

    let found = async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        Affiliates::new(&mut conn).record_click(code).await
    }
    .await
    .unwrap_or_else(|err| {
        tracing::warn!(error = %err, "click tracking failed; reporting not found");
        false
    });

    Ok(Json(TrackClickResponse { found }))
}

/// `GET /api/affiliates/stats?code=`
#[tracing::instrument(skip_all)]
pub async fn affiliate_stats(State(state): State<AppState>, Query(params): Query<AffiliateStatsParams>) -> Result<Json<AffiliateStatsResponse>> {
    let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
        return Err(Error::bad_request("code is required"));
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let stats = Affiliates::new(&mut conn).stats(code).await?.ok_or_else(|| Error::NotFound {
        resource: "affiliate".to_string(),
        id: code.to_string(),
    })?;

    Ok(Json(AffiliateStatsResponse { success: true, stats }))
}
