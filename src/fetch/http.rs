//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use super::{Request, Response, Transport};
use crate::error::Result;

/// Transport that issues real HTTP(S) requests.
///
/// No timeout is applied unless one is configured; callers bound
/// resolution time through the `Context` cancellation token instead.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Create a transport with an optional per-request timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Wrap a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &Request) -> Result<Response> {
        let response = self
            .client
            .get(request.uri.clone())
            .header(ACCEPT, request.accept.as_str())
            .send()
            .await?;

        let uri = response.url().clone();
        if uri != request.uri {
            log::debug!("redirects lead from {} to {}", request.uri, uri);
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            uri,
            status,
            content_type,
            body,
        })
    }
}
