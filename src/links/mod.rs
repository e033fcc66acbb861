//! Tracking-link lifecycle service
//!
//! Code generation, create-with-unique-code, edit and delete. Sits between
//! the HTTP handlers and the storage trait so the retry policy and shortener
//! fallback are testable without a server.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::models::{CreateLinkRequest, LinkScope, NewTrackingLink, TrackingLink};
use crate::shortener::ShortenerClient;
use crate::storage::{Storage, StorageError};

pub const TRACKING_CODE_LEN: usize = 6;
const MAX_CODE_ATTEMPTS: usize = 10;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("could not generate a unique tracking code after 10 attempts")]
    CodeExhausted,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// 6 random alphanumeric characters
pub fn generate_tracking_code() -> String {
    let mut rng = rand::thread_rng();
    (0..TRACKING_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub struct LinkService {
    storage: Arc<dyn Storage>,
    shortener: Option<Arc<ShortenerClient>>,
    /// Base of the redirect server, where tracking URLs land
    public_base_url: String,
    /// Base of the API server, where analytics URLs land
    api_base_url: String,
}

impl LinkService {
    pub fn new(
        storage: Arc<dyn Storage>,
        shortener: Option<Arc<ShortenerClient>>,
        public_base_url: String,
        api_base_url: String,
    ) -> Self {
        Self {
            storage,
            shortener,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a link, regenerating the code on collision (bounded retries).
    ///
    /// Uniqueness is enforced by the storage layer, so concurrent creations
    /// racing on the same code collapse into one winner and a retry.
    pub async fn create(&self, req: CreateLinkRequest) -> Result<TrackingLink, LinkError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_tracking_code();
            let tracking_url = format!("{}/t/{}", self.public_base_url, code);
            let analytics_url =
                format!("{}/api/analytics/trends?link_code={}", self.api_base_url, code);

            let (tracking_url, original_tracking_url) = self.shorten_or_keep(&tracking_url, &req.name).await;

            let new_link = NewTrackingLink {
                tracking_code: code,
                name: req.name.clone(),
                destination_url: req.destination_url.clone(),
                tracking_url,
                original_tracking_url,
                analytics_url,
                user_id: req.user_id.clone(),
                organization_id: req.organization_id.clone(),
            };

            match self.storage.create_link(&new_link).await {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict) => continue,
                Err(StorageError::Other(e)) => return Err(LinkError::Storage(e)),
            }
        }

        Err(LinkError::CodeExhausted)
    }

    /// Shorten the tracking URL when a shortener is configured; any failure
    /// falls back to the unshortened URL.
    async fn shorten_or_keep(&self, tracking_url: &str, title: &str) -> (String, Option<String>) {
        let Some(shortener) = self.shortener.as_ref() else {
            return (tracking_url.to_string(), None);
        };

        match shortener.shorten(tracking_url, title).await {
            Ok(short) => (short.short_url, Some(tracking_url.to_string())),
            Err(err) => {
                warn!(error = %err, "shortener unavailable, using unshortened tracking URL");
                (tracking_url.to_string(), None)
            }
        }
    }

    pub async fn get(&self, tracking_code: &str) -> anyhow::Result<Option<TrackingLink>> {
        self.storage.get_link_by_code(tracking_code).await
    }

    pub async fn update(
        &self,
        tracking_code: &str,
        name: Option<&str>,
        destination_url: Option<&str>,
    ) -> anyhow::Result<bool> {
        self.storage
            .update_link(tracking_code, name, destination_url)
            .await
    }

    /// Delete the link. Recorded clicks are kept.
    pub async fn delete(&self, tracking_code: &str) -> anyhow::Result<bool> {
        self.storage.delete_link(tracking_code).await
    }

    pub async fn list(&self, scope: &LinkScope) -> anyhow::Result<Vec<TrackingLink>> {
        self.storage.list_links(scope).await
    }
}
