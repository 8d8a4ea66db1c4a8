//! Ref-engine discovery through the host's well-known URI.
//!
//! For each transport protocol in order, `{protocol}://{host}/.well-known/oci-host-ref-engines`
//! is fetched as `application/vnd.oci.ref-engines.v1+json`. A candidate that
//! cannot be fetched or decoded contributes nothing and the next one is tried.

use async_trait::async_trait;
use url::Url;

use super::{DiscoveryDocument, DiscoveryEngine, Flow, ReferenceSink};
use crate::defaults::{self, REF_ENGINES_MEDIA_TYPE, WELL_KNOWN_PATH};
use crate::error::{Error, Result};
use crate::fetch::{fetch_json, Context};
use crate::name;

/// Discovery engine for the well-known URI protocol.
#[derive(Debug, Clone)]
pub struct WellKnownEngine {
    protocols: Vec<String>,
    port: Option<u16>,
}

impl WellKnownEngine {
    /// Create an engine trying `protocols` in order; empty means `https`, then `http`.
    pub fn new(protocols: Vec<String>) -> Self {
        let protocols = if protocols.is_empty() {
            defaults::protocols()
        } else {
            protocols
        };
        Self {
            protocols,
            port: None,
        }
    }

    /// Connect to `port` instead of the protocol's default.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// The well-known URI for `host` over `protocol`.
    ///
    /// Fails for an empty host or one that is not a valid authority host.
    pub fn well_known_uri(&self, protocol: &str, host: &str) -> Result<Url> {
        if host.is_empty() {
            return Err(Error::InvalidUri(format!(
                "cannot build a {protocol} well-known URI for an empty host"
            )));
        }

        let mut uri = Url::parse(&format!("{protocol}://localhost{WELL_KNOWN_PATH}"))?;
        uri.set_host(Some(host))?;
        uri.set_port(self.port).map_err(|()| {
            Error::InvalidUri(format!("{protocol} URIs for {host} cannot carry a port"))
        })?;
        Ok(uri)
    }
}

impl Default for WellKnownEngine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DiscoveryEngine for WellKnownEngine {
    async fn ref_engines(
        &self,
        ctx: &Context,
        name: &str,
        sink: &mut dyn ReferenceSink,
    ) -> Result<Flow> {
        let parsed = match name::parse(name) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("{}", e);
                return Ok(Flow::Continue);
            }
        };

        // Only the name's own host is consulted, never its parent domains.
        for protocol in &self.protocols {
            let uri = match self.well_known_uri(protocol, &parsed.host) {
                Ok(uri) => uri,
                Err(e) => {
                    log::warn!("cannot build well-known URI for {} over {}: {}", parsed.host, protocol, e);
                    continue;
                }
            };

            log::debug!("discovering ref engines via {}", uri);
            let document: DiscoveryDocument = match fetch_json(ctx, &uri, REF_ENGINES_MEDIA_TYPE).await {
                Ok(document) => document,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    log::warn!("failed to fetch {} ({})", uri, e);
                    continue;
                }
            };
            log::debug!("received ref-engine discovery object from {}: {:?}", uri, document);

            if document.dispatch(ctx, &uri, sink).await?.is_stop() {
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }
}
