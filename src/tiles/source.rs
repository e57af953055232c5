use std::time::Duration;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use super::TileError;
use crate::util::validate_url_for_open;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where image bytes come from.
pub trait ImageSource: Send + Sync {
    /// Fetch the encoded image identified by `source`.
    fn fetch(&self, source: &str) -> BoxFuture<'_, Result<Vec<u8>, TileError>>;
}

/// Fetches images over HTTP(S) with a response size cap.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageSource {
    pub fn new(client: reqwest::Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, source: &str) -> BoxFuture<'_, Result<Vec<u8>, TileError>> {
        let url = validate_url_for_open(source).map_err(|e| TileError::InvalidUrl(e.to_string()));
        async move {
            let url = url?;
            let response = tokio::time::timeout(FETCH_TIMEOUT, self.client.get(url).send())
                .await
                .map_err(|_| TileError::Timeout)??;

            if !response.status().is_success() {
                return Err(TileError::HttpStatus(response.status().as_u16()));
            }
            if response
                .content_length()
                .is_some_and(|len| len as usize > self.max_bytes)
            {
                return Err(TileError::TooLarge(self.max_bytes));
            }

            let mut bytes = Vec::new();
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                if bytes.len().saturating_add(chunk.len()) > self.max_bytes {
                    return Err(TileError::TooLarge(self.max_bytes));
                }
                bytes.extend_from_slice(&chunk);
            }
            Ok(bytes)
        }
        .boxed()
    }
}
