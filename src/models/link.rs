use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A tracking link: a short code mapped to a destination URL, with a
/// monotonically increasing visit counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingLink {
    pub id: i64,
    pub tracking_code: String,
    pub name: String,
    pub destination_url: String,
    pub tracking_url: String,
    pub original_tracking_url: Option<String>,
    pub analytics_url: String,
    pub visits: i64,
    pub last_visit: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub user_id: String,
    /// None means a personal link; Some means shared with an organization
    pub organization_id: Option<String>,
}

/// Fields needed to insert a new tracking link
#[derive(Debug, Clone)]
pub struct NewTrackingLink {
    pub tracking_code: String,
    pub name: String,
    pub destination_url: String,
    pub tracking_url: String,
    pub original_tracking_url: Option<String>,
    pub analytics_url: String,
    pub user_id: String,
    pub organization_id: Option<String>,
}

/// A single recorded click. Append-only: rows are never mutated or deleted
/// by this service, and they survive deletion of their link.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingClick {
    pub id: i64,
    pub tracking_code: String,
    pub link_id: i64,
    pub clicked_at: i64,
    pub user_agent: Option<String>,
    /// Raw referrer URL, or "direct" when the browser sent none
    pub referrer: String,
    pub referrer_source: String,
    pub referrer_category: String,
    pub referrer_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrackingClick {
    pub tracking_code: String,
    pub link_id: i64,
    pub clicked_at: i64,
    pub user_agent: Option<String>,
    pub referrer: String,
    pub referrer_source: String,
    pub referrer_category: String,
    pub referrer_url: Option<String>,
}

/// Ownership scope for list and analytics queries.
///
/// When `organization_id` is set, all links shared with that organization are
/// in scope; otherwise only the user's personal links are.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkScope {
    pub user_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub name: String,
    pub destination_url: String,
    pub user_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub name: Option<String>,
    pub destination_url: Option<String>,
}
