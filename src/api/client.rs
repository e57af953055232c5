use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use super::{streaming, ApiError, Cursor, FeedSource, ThreadContext};
use crate::model::{Account, ItemId, Post};
use crate::timeline::LiveEvent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// REST client for a Mastodon-compatible server.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct MastodonClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
}

impl std::fmt::Debug for MastodonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonClient")
            .field("base", &self.base.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl MastodonClient {
    /// Build a client for `server`.
    ///
    /// A bare host (`mastodon.social`) is assumed to be HTTPS. Only `http`
    /// and `https` servers are accepted.
    pub fn new(server: &str, token: SecretString) -> Result<Self, ApiError> {
        let base = parse_server(server)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("mastty/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, base, token })
    }

    /// Server root, e.g. `https://mastodon.social/`.
    pub fn server(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, cursor: Option<&Cursor>) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        if let Some(cursor) = cursor {
            let mut pairs = url.query_pairs_mut();
            if let Some(max_id) = &cursor.max_id {
                pairs.append_pair("max_id", max_id.as_str());
            }
            if let Some(since_id) = &cursor.since_id {
                pairs.append_pair("since_id", since_id.as_str());
            }
            if let Some(limit) = cursor.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        // Drop a dangling "?" left by an empty cursor
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");
        let request = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send();

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request)
            .await
            .map_err(|_| ApiError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn parse_server(server: &str) -> Result<Url, ApiError> {
    let trimmed = server.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidUrl("server is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(ApiError::InvalidUrl("server has no host".to_string()));
    }

    // Relative joins replace the last segment unless the path ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[derive(serde::Deserialize)]
struct ContextResponse {
    #[serde(default)]
    ancestors: Vec<Post>,
    #[serde(default)]
    descendants: Vec<Post>,
}

impl FeedSource for MastodonClient {
    fn home_timeline(&self, cursor: Cursor) -> BoxFuture<'_, Result<Vec<Post>, ApiError>> {
        async move {
            let url = self.endpoint("api/v1/timelines/home", Some(&cursor))?;
            self.get_json(url).await
        }
        .boxed()
    }

    fn status_context(&self, id: &ItemId) -> BoxFuture<'_, Result<ThreadContext, ApiError>> {
        let path = format!("api/v1/statuses/{id}/context");
        async move {
            let url = self.endpoint(&path, None)?;
            let context: ContextResponse = self.get_json(url).await?;
            Ok(ThreadContext {
                ancestors: context.ancestors,
                descendants: context.descendants,
            })
        }
        .boxed()
    }

    fn account(&self, id: &ItemId) -> BoxFuture<'_, Result<Account, ApiError>> {
        let path = format!("api/v1/accounts/{id}");
        async move {
            let url = self.endpoint(&path, None)?;
            self.get_json(url).await
        }
        .boxed()
    }

    fn current_account(&self) -> BoxFuture<'_, Result<Account, ApiError>> {
        async move {
            let url = self.endpoint("api/v1/accounts/verify_credentials", None)?;
            self.get_json(url).await
        }
        .boxed()
    }

    fn account_statuses(
        &self,
        id: &ItemId,
        cursor: Cursor,
    ) -> BoxFuture<'_, Result<Vec<Post>, ApiError>> {
        let path = format!("api/v1/accounts/{id}/statuses");
        async move {
            let url = self.endpoint(&path, Some(&cursor))?;
            self.get_json(url).await
        }
        .boxed()
    }

    fn subscribe_live_updates(&self) -> BoxStream<'static, LiveEvent> {
        let url = match self.endpoint("api/v1/streaming/user", None) {
            Ok(url) => url,
            Err(e) => {
                return futures::stream::once(async move { LiveEvent::StreamError(e.to_string()) })
                    .boxed()
            }
        };

        let request = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, "text/event-stream");
        streaming::live_events(request)
    }
}
