//! Analytics API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::AppState;
use crate::analytics::{referrer_breakdown, summarize, visit_trends};
use crate::models::LinkScope;

#[derive(Debug, Deserialize)]
pub struct TrendsQueryParams {
    /// Owner scope; optional when `link_code` is given
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub organization_id: Option<String>,

    /// Number of calendar days ending today (default: 30, max: 365)
    #[serde(default = "default_days")]
    pub days: u32,

    /// Narrow the series to a single link by id
    #[serde(default)]
    pub link_id: Option<i64>,

    /// Narrow the series to a single link by tracking code. The link also
    /// supplies the scope, so a stored analytics URL works on its own.
    #[serde(default)]
    pub link_code: Option<String>,
}

fn default_days() -> u32 {
    30
}

/// Dashboard summary for all links in scope
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<LinkScope>,
) -> impl IntoResponse {
    match summarize(state.storage.as_ref(), &scope).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::error!("Failed to compute summary: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to compute summary",
            )
                .into_response()
        }
    }
}

/// Clicks grouped by referrer source and category
pub async fn get_referrers(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<LinkScope>,
) -> impl IntoResponse {
    match referrer_breakdown(state.storage.as_ref(), &scope).await {
        Ok(breakdown) => Json(breakdown).into_response(),
        Err(e) => {
            tracing::error!("Failed to compute referrer breakdown: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to compute referrer breakdown",
            )
                .into_response()
        }
    }
}

/// Dense daily visit series
pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendsQueryParams>,
) -> impl IntoResponse {
    let days = params.days.clamp(1, 365);

    let (scope, link_id) = if let Some(code) = params.link_code.as_deref() {
        match state.storage.get_link_by_code(code).await {
            Ok(Some(link)) => (
                LinkScope {
                    user_id: link.user_id,
                    organization_id: link.organization_id,
                },
                Some(link.id),
            ),
            Ok(None) => {
                return (StatusCode::NOT_FOUND, "Tracking link not found").into_response();
            }
            Err(e) => {
                tracing::error!("Failed to resolve tracking code: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to compute visit trends",
                )
                    .into_response();
            }
        }
    } else if let Some(user_id) = params.user_id {
        (
            LinkScope {
                user_id,
                organization_id: params.organization_id,
            },
            params.link_id,
        )
    } else {
        return (
            StatusCode::BAD_REQUEST,
            "Either link_code or user_id is required",
        )
            .into_response();
    };

    match visit_trends(state.storage.as_ref(), &scope, days, link_id).await {
        Ok(series) => Json(series).into_response(),
        Err(e) => {
            tracing::error!("Failed to compute visit trends: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to compute visit trends",
            )
                .into_response()
        }
    }
}
