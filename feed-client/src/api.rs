use crate::retry::{retry_with_backoff, RetryConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;
use whosaid_core::{
    ConfigError, CoreError, FeedConfig, FeedError, FeedPost, FeedUser, TimelineSource,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedUserData {
    pub id: i64,
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPostData {
    pub id: i64,
    pub text: String,
}

/// Timeline payload; posts arrive newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub posts: Vec<FeedPostData>,
}

/// HTTP client for the remote feed service.
#[derive(Debug)]
pub struct FeedApiClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
    page_size: u32,
    retry: RetryConfig,
}

impl FeedApiClient {
    pub fn new(config: &FeedConfig) -> Result<Self, CoreError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| ConfigError::InvalidValue {
                field: "feed.base_url".to_string(),
                value: config.base_url.clone(),
            })?
            .to_string();

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                FeedError::Unavailable {
                    reason: format!("failed to construct HTTP client: {e}"),
                }
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            page_size: config.page_size,
            retry: RetryConfig::default(),
        })
    }

    fn user_url(&self, handle: &str) -> String {
        format!("{}/users/{}", self.base_url, handle)
    }

    fn timeline_url(&self, handle: &str) -> String {
        format!("{}/users/{}/timeline", self.base_url, handle)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        handle: &str,
        query: &[(&str, String)],
    ) -> Result<T, FeedError> {
        let mut request = self.http_client.get(url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        debug!("Feed request: GET {}", url);
        let response = request.send().await.map_err(|e| {
            error!("Network error for GET {}: {}", url, e);
            if e.is_timeout() {
                FeedError::RequestTimeout
            } else {
                FeedError::Unavailable {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            error!("Feed request failed with status {} for {}", status, url);
            return Err(map_error_status(status, handle, retry_after));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse feed response from {}: {}", url, e);
            FeedError::InvalidResponse {
                details: e.to_string(),
            }
        })
    }

    async fn lookup_user_once(&self, handle: &str) -> Result<FeedUser, FeedError> {
        let user: FeedUserData = self
            .get_json(&self.user_url(handle), handle, &[])
            .await?;
        debug!("Resolved handle {} to feed user id {}", handle, user.id);
        Ok(user.into())
    }

    async fn fetch_posts_once(
        &self,
        handle: &str,
        since_id: Option<i64>,
    ) -> Result<Vec<FeedPost>, FeedError> {
        let mut query = vec![
            ("limit", self.page_size.to_string()),
            ("exclude_replies", "true".to_string()),
            ("include_reposts", "false".to_string()),
        ];
        if let Some(since) = since_id {
            query.push(("since_id", since.to_string()));
        }

        let timeline: TimelineResponse = self
            .get_json(&self.timeline_url(handle), handle, &query)
            .await?;

        info!(
            "Retrieved {} posts for {} (since_id={:?})",
            timeline.posts.len(),
            handle,
            since_id
        );
        Ok(timeline.posts.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TimelineSource for FeedApiClient {
    async fn lookup_user(&self, handle: &str) -> Result<FeedUser, FeedError> {
        retry_with_backoff(&self.retry, || self.lookup_user_once(handle)).await
    }

    async fn fetch_posts(
        &self,
        handle: &str,
        since_id: Option<i64>,
    ) -> Result<Vec<FeedPost>, FeedError> {
        retry_with_backoff(&self.retry, || self.fetch_posts_once(handle, since_id)).await
    }
}

/// Map a non-success HTTP status onto the feed error taxonomy.
fn map_error_status(status: StatusCode, handle: &str, retry_after: Option<u64>) -> FeedError {
    match status.as_u16() {
        401 | 403 => FeedError::Unauthorized,
        404 => FeedError::UnknownHandle {
            handle: handle.to_string(),
        },
        408 => FeedError::RequestTimeout,
        429 => FeedError::RateLimitExceeded {
            retry_after: retry_after.unwrap_or(60),
        },
        code if status.is_server_error() => FeedError::ServerError { status_code: code },
        code => FeedError::InvalidResponse {
            details: format!("unexpected status {code}"),
        },
    }
}

impl From<FeedUserData> for FeedUser {
    fn from(data: FeedUserData) -> Self {
        Self {
            id: data.id,
            handle: data.handle,
        }
    }
}

impl From<FeedPostData> for FeedPost {
    fn from(data: FeedPostData) -> Self {
        Self {
            id: data.id,
            text: data.text,
        }
    }
}
