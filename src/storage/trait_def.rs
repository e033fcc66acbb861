use crate::models::{LinkScope, NewTrackingClick, NewTrackingLink, TrackingClick, TrackingLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of link ids a single `clicks_for_links` call may carry.
/// Mirrors the IN-clause batch limit of document-store backends; callers
/// must chunk larger id sets.
pub const MAX_IN_CLAUSE_IDS: usize = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("tracking code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new tracking link. Fails with `StorageError::Conflict` when
    /// the tracking code is already taken.
    async fn create_link(&self, link: &NewTrackingLink) -> StorageResult<TrackingLink>;

    /// Resolve a link by its tracking code
    async fn get_link_by_code(&self, tracking_code: &str) -> Result<Option<TrackingLink>>;

    /// Update name and/or destination. Returns false when no link matched.
    async fn update_link(
        &self,
        tracking_code: &str,
        name: Option<&str>,
        destination_url: Option<&str>,
    ) -> Result<bool>;

    /// Delete a link. Click history is intentionally left in place.
    async fn delete_link(&self, tracking_code: &str) -> Result<bool>;

    /// List links in scope, newest first
    async fn list_links(&self, scope: &LinkScope) -> Result<Vec<TrackingLink>>;

    /// Append a click row and bump the link's visit counter in one
    /// transaction, so a stored click always has a matching increment.
    async fn record_click(&self, click: &NewTrackingClick) -> Result<TrackingClick>;

    /// Fetch clicks for a batch of link ids, optionally bounded below by a
    /// unix-second timestamp. `link_ids` must not exceed `MAX_IN_CLAUSE_IDS`.
    async fn clicks_for_links(
        &self,
        link_ids: &[i64],
        since: Option<i64>,
    ) -> Result<Vec<TrackingClick>>;
}
