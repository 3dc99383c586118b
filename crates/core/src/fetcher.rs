//! Upstream fetcher owning the single time-boxed cache of normalized items.

use crate::config::{Credentials, UpstreamConfig, REQUEST_TIMEOUT, USER_AGENT};
use crate::error::{HotSearchError, HotSearchResult};
use crate::mapping::{FieldMap, TrendTable};
use crate::normalize::{normalize, validate_envelope};
use crate::types::NormalizedItem;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// How long a successful fetch is served from cache.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// The last successful fetch. Replaced as a whole, never field by field.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<NormalizedItem>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, window: Duration) -> bool {
        self.fetched_at.elapsed() < window
    }
}

/// Fetches, validates, normalizes and caches the upstream hot-search list.
///
/// One instance per process, shared behind an `Arc`. Cache misses are
/// serialized behind a refresh gate so concurrent misses share one request.
pub struct ContentFetcher {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
    fields: FieldMap,
    trends: TrendTable,
    freshness_window: Duration,
    cache: RwLock<Option<CacheEntry>>,
    refresh_gate: Mutex<()>,
}

impl ContentFetcher {
    /// Create a fetcher builder for the given credentials.
    pub fn builder(credentials: Credentials) -> ContentFetcherBuilder {
        ContentFetcherBuilder::new(credentials)
    }

    /// Return the normalized list, from cache when allowed and still fresh.
    pub async fn fetch(&self, use_cache: bool) -> HotSearchResult<Vec<NormalizedItem>> {
        if use_cache {
            if let Some(data) = self.cached().await {
                tracing::debug!("Serving {} hot-search items from cache", data.len());
                return Ok(data);
            }
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate
        if use_cache {
            if let Some(data) = self.cached().await {
                tracing::debug!("Cache refreshed by a concurrent fetch");
                return Ok(data);
            }
        }

        let data = self.fetch_upstream().await.inspect_err(|e| {
            tracing::warn!("Hot-search fetch failed: {}", e);
        })?;

        *self.cache.write().await = Some(CacheEntry {
            data: data.clone(),
            fetched_at: Instant::now(),
        });

        tracing::info!("Fetched {} hot-search items", data.len());
        Ok(data)
    }

    /// First `count` items of the list.
    pub async fn top(&self, count: usize, use_cache: bool) -> HotSearchResult<Vec<NormalizedItem>> {
        let mut data = self.fetch(use_cache).await?;
        data.truncate(count);
        Ok(data)
    }

    /// Items whose title contains `keyword`, ignoring case, in rank order.
    pub async fn search(&self, keyword: &str) -> HotSearchResult<Vec<NormalizedItem>> {
        let needle = keyword.to_lowercase();
        let data = self.fetch(true).await?;

        Ok(data
            .into_iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .collect())
    }

    /// Discard the cached list; the next fetch always goes upstream.
    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
        tracing::info!("Hot-search cache cleared");
    }

    async fn cached(&self) -> Option<Vec<NormalizedItem>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.is_fresh(self.freshness_window))
            .map(|entry| entry.data.clone())
    }

    async fn fetch_upstream(&self) -> HotSearchResult<Vec<NormalizedItem>> {
        tracing::info!("Fetching hot-search list from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("id", self.credentials.id()), ("key", self.credentials.key())])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HotSearchError::UpstreamRequestFailed {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        let json: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("Upstream body is not JSON: {}", e);
            HotSearchError::UpstreamRequestFailed {
                status: status.as_u16(),
            }
        })?;

        let items = validate_envelope(json)?;
        Ok(normalize(&items, &self.fields, &self.trends))
    }
}

/// Map a transport-level failure. The URL is stripped so the key never
/// reaches an error message.
fn request_error(err: reqwest::Error) -> HotSearchError {
    let err = err.without_url();
    if err.is_timeout() {
        HotSearchError::network("request timed out or got no response")
    } else if let Some(status) = err.status() {
        HotSearchError::UpstreamRequestFailed {
            status: status.as_u16(),
        }
    } else {
        HotSearchError::network(err.to_string())
    }
}

/// Builder for [`ContentFetcher`].
pub struct ContentFetcherBuilder {
    credentials: Credentials,
    endpoint: Url,
    fields: FieldMap,
    trends: TrendTable,
    freshness_window: Duration,
    request_timeout: Duration,
}

impl ContentFetcherBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: UpstreamConfig::default().endpoint,
            fields: FieldMap::default(),
            trends: TrendTable::default(),
            freshness_window: FRESHNESS_WINDOW,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Set the upstream endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set the upstream field names.
    pub fn fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    /// Set the trend label table.
    pub fn trends(mut self, trends: TrendTable) -> Self {
        self.trends = trends;
        self
    }

    /// Override the cache freshness window.
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    #[cfg(test)]
    fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the fetcher.
    pub fn build(self) -> HotSearchResult<ContentFetcher> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| {
                HotSearchError::ConfigInvalid(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(ContentFetcher {
            client,
            endpoint: self.endpoint,
            credentials: self.credentials,
            fields: self.fields,
            trends: self.trends,
            freshness_window: self.freshness_window,
            cache: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        })
    }
}
