//! HTTP client for the upstream feeds
//!
//! Both feeds are plain JSON documents. Each request is attempted up to
//! `max_attempts` times; transport failures, timeouts, 429 and 5xx are
//! retried, any other status fails at once.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;

use crate::config::FeedsConfig;
use crate::error::Result;
use crate::models::{DownloadHistory, ModDatabase};
use crate::utils::error::{FetchError, PayloadError};
use crate::utils::retry::{with_retry_if, RetryConfig};

const DOWNLOAD_HISTORY_FEED: &str = "download history";
const DATABASE_FEED: &str = "mod database";

/// Fetches the download history and the mod database
pub struct FeedClient {
    client: Client,
    retry: RetryConfig,
    download_history_url: String,
    database_url: String,
}

impl FeedClient {
    /// Create a client from the feed configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for unparsable feed URLs and
    /// `FetchError::Http` if the HTTP client cannot be built
    pub fn new(config: &FeedsConfig) -> std::result::Result<Self, FetchError> {
        for url in [&config.download_history_url, &config.database_url] {
            url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.clone()))?;
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            retry: config.retry(),
            download_history_url: config.download_history_url.clone(),
            database_url: config.database_url.clone(),
        })
    }

    /// Fetch a URL as text with bounded retry
    ///
    /// # Errors
    ///
    /// Returns the non-retryable error as-is, or `FetchError::Exhausted`
    /// wrapping the last failure once every attempt failed
    pub async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        tracing::info!(url = %url, "Downloading feed");

        with_retry_if(&self.retry, || self.fetch_once(url), FetchError::is_recoverable)
            .await
            .map_err(|failure| {
                if failure.exhausted {
                    FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: failure.attempts,
                        source: Box::new(failure.error),
                    }
                } else {
                    failure.error
                }
            })
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Fetch and decode the download history
    pub async fn download_history(&self) -> Result<DownloadHistory> {
        let body = self.fetch_text(&self.download_history_url).await?;
        let history = parse_download_history(&body)?;
        tracing::info!(entries = history.len(), "Download history loaded");
        Ok(history)
    }

    /// Fetch and decode the mod database
    pub async fn mod_database(&self) -> Result<ModDatabase> {
        let body = self.fetch_text(&self.database_url).await?;
        let database = parse_mod_database(&body)?;
        tracing::info!(releases = database.releases.len(), "Mod database loaded");
        Ok(database)
    }
}

/// Decode a download-history document
///
/// A `null` document or an empty array is [`PayloadError::Empty`].
pub fn parse_download_history(body: &str) -> std::result::Result<DownloadHistory, PayloadError> {
    let history: Option<DownloadHistory> =
        serde_json::from_str(body).map_err(|source| PayloadError::Malformed {
            feed: DOWNLOAD_HISTORY_FEED,
            source,
        })?;

    match history {
        Some(history) if !history.is_empty() => Ok(history),
        _ => Err(PayloadError::Empty {
            feed: DOWNLOAD_HISTORY_FEED,
        }),
    }
}

/// Decode a mod-database document
pub fn parse_mod_database(body: &str) -> std::result::Result<ModDatabase, PayloadError> {
    let database: Option<ModDatabase> =
        serde_json::from_str(body).map_err(|source| PayloadError::Malformed {
            feed: DATABASE_FEED,
            source,
        })?;

    match database {
        Some(database) if !database.releases.is_empty() => Ok(database),
        _ => Err(PayloadError::Empty { feed: DATABASE_FEED }),
    }
}
