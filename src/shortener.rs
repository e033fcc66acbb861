//! Optional URL-shortener client
//!
//! The click-recording pipeline never depends on this: a shortener failure
//! only means the unshortened tracking URL is handed out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("shortener request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    url: &'a str,
    title: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct Shortened {
    pub id: String,
    pub short_url: String,
}

pub struct ShortenerClient {
    endpoint: String,
    http: reqwest::Client,
}

impl ShortenerClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    /// Shorten a long URL. Rejects malformed URLs before going to the network.
    pub async fn shorten(&self, long_url: &str, title: &str) -> Result<Shortened, ShortenError> {
        let parsed = url::Url::parse(long_url)
            .map_err(|_| ShortenError::InvalidUrl(long_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenError::InvalidUrl(long_url.to_string()));
        }

        let response = self
            .http
            .post(&self.endpoint)
            .json(&ShortenRequest {
                url: long_url,
                title,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Shortened>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_rejected_before_any_request() {
        let client = ShortenerClient::new("http://127.0.0.1:1/shorten".to_string());
        let err = client.shorten("not a url", "x").await.unwrap_err();
        assert!(matches!(err, ShortenError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let client = ShortenerClient::new("http://127.0.0.1:1/shorten".to_string());
        let err = client.shorten("ftp://example.com/file", "x").await.unwrap_err();
        assert!(matches!(err, ShortenError::InvalidUrl(_)));
    }
}
