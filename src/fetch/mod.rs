//! Document fetching.
//!
//! This module provides:
//! - The `Transport` seam over which every GET is issued
//! - A cancellable `Context` threaded through each blocking call
//! - `fetch_json`, which enforces status, media type, and schema

pub mod http;
pub mod memory;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use http::HttpTransport;
pub use memory::MemoryTransport;

use crate::error::{Error, Result};

/// A GET request for a single media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub uri: Url,
    /// Value of the `Accept` header
    pub accept: String,
}

impl Request {
    pub fn new(uri: Url, accept: impl Into<String>) -> Self {
        Self {
            uri,
            accept: accept.into(),
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URI the body was served from, after any redirects
    pub uri: Url,
    pub status: u16,
    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// The media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(media_type_essence)
    }

    /// Fail on 4xx and 5xx statuses.
    pub fn error_for_status(&self) -> Result<()> {
        if self.status >= 400 {
            return Err(Error::Status {
                uri: self.uri.to_string(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Fail unless the response carries exactly `requested`.
    pub fn require_media_type(&self, requested: &str) -> Result<()> {
        let received = self.media_type().unwrap_or_default();
        if received != media_type_essence(requested) {
            return Err(Error::MediaType {
                uri: self.uri.to_string(),
                requested: requested.to_string(),
                received,
            });
        }
        Ok(())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode {
            uri: self.uri.to_string(),
            source,
        })
    }
}

/// Strip parameters (such as `charset`) from a `Content-Type` value.
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Issues GET requests on behalf of discovery and ref-engines.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &Request) -> Result<Response>;
}

/// Per-resolution context: the transport plus a cancellation token.
///
/// Cloning is cheap and clones share the same cancellation state.
#[derive(Clone)]
pub struct Context {
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
}

impl Context {
    /// Create a context that is never cancelled unless asked to be.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_cancellation(transport, CancellationToken::new())
    }

    /// Create a context bound to an existing cancellation token.
    pub fn with_cancellation(transport: Arc<dyn Transport>, cancel: CancellationToken) -> Self {
        Self { transport, cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `future` unless the context is cancelled first.
    pub async fn guard<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = future => result,
        }
    }

    /// Issue a GET through the context's transport.
    pub async fn get(&self, request: &Request) -> Result<Response> {
        log::debug!("requesting {} from {}", request.accept, request.uri);
        self.guard(self.transport.get(request)).await
    }

    /// Read a local file, honouring cancellation.
    pub async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.guard(async { Ok(tokio::fs::read(path).await?) }).await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// GET `uri` as `media_type` and decode the JSON body.
pub async fn fetch_json<T: DeserializeOwned>(ctx: &Context, uri: &Url, media_type: &str) -> Result<T> {
    let response = ctx.get(&Request::new(uri.clone(), media_type)).await?;
    response.error_for_status()?;
    response.require_media_type(media_type)?;
    response.json()
}
