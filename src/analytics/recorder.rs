//! Click recorder: the write path of the tracking pipeline
//!
//! One accepted hit produces exactly one stored click and one visit
//! increment (a single storage transaction). Suppressed hits still resolve
//! the destination so the caller can redirect, but touch nothing.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::analytics::guard::ClickGuard;
use crate::analytics::referrer::classify;
use crate::models::NewTrackingClick;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no tracking link for this code")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Caller-provided request context, stored verbatim on the click row
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

pub struct ClickRecorder {
    storage: Arc<dyn Storage>,
    guard: Arc<dyn ClickGuard>,
}

impl ClickRecorder {
    pub fn new(storage: Arc<dyn Storage>, guard: Arc<dyn ClickGuard>) -> Self {
        Self { storage, guard }
    }

    /// Record a click against `tracking_code` and return the destination URL.
    ///
    /// Duplicate hits inside the guard window resolve the destination without
    /// writing anything, so a doubled page effect cannot double the counter.
    pub async fn record(
        &self,
        tracking_code: &str,
        context: ClickContext,
    ) -> Result<String, RecordError> {
        if self.guard.should_suppress(tracking_code) {
            debug!(tracking_code, "duplicate click suppressed");
            let link = self
                .storage
                .get_link_by_code(tracking_code)
                .await?
                .ok_or(RecordError::NotFound)?;
            return Ok(link.destination_url);
        }
        let link = self
            .storage
            .get_link_by_code(tracking_code)
            .await?
            .ok_or(RecordError::NotFound)?;

        // only resolvable codes arm the guard
        self.guard.record_attempt(tracking_code);

        let classified = classify(context.referrer.as_deref());
        let clicked_at = chrono::Utc::now().timestamp();

        let click = NewTrackingClick {
            tracking_code: tracking_code.to_string(),
            link_id: link.id,
            clicked_at,
            user_agent: context.user_agent,
            referrer: context
                .referrer
                .clone()
                .unwrap_or_else(|| "direct".to_string()),
            referrer_source: classified.source,
            referrer_category: classified.category.as_str().to_string(),
            referrer_url: context.referrer,
        };

        self.storage.record_click(&click).await?;

        Ok(link.destination_url)
    }
}
