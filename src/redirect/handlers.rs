use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use crate::analytics::{ClickContext, ClickRecorder, RecordError};

pub struct RedirectState {
    pub recorder: Arc<ClickRecorder>,
}

/// Resolve a tracking code, record the click and redirect to the destination
pub async fn redirect_tracked(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let context = ClickContext {
        referrer: header_value(&headers, header::REFERER),
        user_agent: header_value(&headers, header::USER_AGENT),
    };

    match state.recorder.record(&code, context).await {
        // 307 so browsers re-request through us on every click
        Ok(destination) => Redirect::temporary(&destination).into_response(),
        Err(RecordError::NotFound) => {
            (StatusCode::NOT_FOUND, "Tracking link not found").into_response()
        }
        Err(RecordError::Storage(err)) => {
            tracing::error!(tracking_code = %code, error = %err, "failed to record click");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
