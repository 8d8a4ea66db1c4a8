//! In-memory transport serving canned responses.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use url::Url;

use super::{Request, Response, Transport};
use crate::error::Result;

/// Transport that answers from a fixed table keyed by URI.
///
/// Unknown URIs answer `404` with no content type. Every request is
/// recorded so callers can check what was asked for, and in what order.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: Mutex<HashMap<String, Response>>,
    requests: Mutex<Vec<Request>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `content_type` and status 200 at `uri`.
    pub fn with_response(self, uri: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Result<Self> {
        self.insert(uri, 200, Some(content_type), body)?;
        Ok(self)
    }

    /// Serve a JSON document at `uri`.
    pub fn with_json(self, uri: &str, content_type: &str, body: &serde_json::Value) -> Result<Self> {
        self.with_response(uri, content_type, body.to_string())
    }

    /// Add or replace the response for `uri`.
    pub fn insert(
        &self,
        uri: &str,
        status: u16,
        content_type: Option<&str>,
        body: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let uri = Url::parse(uri)?;
        let response = Response {
            uri: uri.clone(),
            status,
            content_type: content_type.map(String::from),
            body: body.into(),
        };
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.to_string(), response);
        Ok(())
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URIs requested so far, oldest first.
    pub fn requested_uris(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.uri.to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, request: &Request) -> Result<Response> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let found = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request.uri.as_str())
            .cloned();

        Ok(found.unwrap_or_else(|| Response {
            uri: request.uri.clone(),
            status: 404,
            content_type: None,
            body: Vec::new(),
        }))
    }
}
