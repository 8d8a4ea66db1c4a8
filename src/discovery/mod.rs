//! Ref-engine discovery.
//!
//! This module provides:
//! - The discovery document model (`DiscoveryDocument`)
//! - The `DiscoveryEngine` and `ReferenceSink` seams
//! - Network discovery via the host's well-known URI (`well_known`)
//! - Local discovery via regex-keyed config files (`local_config`)

pub mod local_config;
pub mod priority;
pub mod well_known;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub use local_config::LocalConfigEngine;
pub use well_known::WellKnownEngine;

use crate::engine::{EngineConfig, EngineReference};
use crate::error::Result;
use crate::fetch::Context;

/// Whether iteration should carry on after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The caller is satisfied; stop all further discovery and resolution.
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Self::Stop
    }
}

/// A ref-engines object (`application/vnd.oci.ref-engines.v1+json`).
///
/// Entry order is the publisher's preference order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ref_engines: Vec<EngineConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cas_engines: Vec<EngineConfig>,
}

impl DiscoveryDocument {
    /// CAS-engine suggestions resolved against the declaring document.
    pub fn cas_engine_references(&self, source: &Url) -> Vec<EngineReference> {
        self.cas_engines
            .iter()
            .map(|config| EngineReference::new(config.clone(), source.clone()))
            .collect()
    }

    /// Hand each ref-engine entry, in document order, to `sink`.
    ///
    /// Every entry carries the document's full CAS-engine list.
    pub async fn dispatch(
        &self,
        ctx: &Context,
        source: &Url,
        sink: &mut dyn ReferenceSink,
    ) -> Result<Flow> {
        let cas_engines = self.cas_engine_references(source);

        for config in &self.ref_engines {
            let reference = RefEngineReference {
                engine: EngineReference::new(config.clone(), source.clone()),
                cas_engines: cas_engines.clone(),
            };
            if sink.on_reference(ctx, reference).await?.is_stop() {
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }
}

/// A discovered ref-engine and the CAS-engines suggested alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefEngineReference {
    #[serde(flatten)]
    pub engine: EngineReference,
    #[serde(rename = "casEngines", default, skip_serializing_if = "Vec::is_empty")]
    pub cas_engines: Vec<EngineReference>,
}

/// Receives ref-engine references as discovery finds them.
#[async_trait]
pub trait ReferenceSink: Send {
    async fn on_reference(&mut self, ctx: &Context, reference: RefEngineReference) -> Result<Flow>;
}

/// Collects every reference without stopping.
#[async_trait]
impl ReferenceSink for Vec<RefEngineReference> {
    async fn on_reference(&mut self, _ctx: &Context, reference: RefEngineReference) -> Result<Flow> {
        self.push(reference);
        Ok(Flow::Continue)
    }
}

/// A source of ref-engine configuration for image names.
#[async_trait]
pub trait DiscoveryEngine: Send + Sync {
    /// Find ref-engines for `name` and pass each to `sink`.
    ///
    /// Returns `Flow::Stop` as soon as the sink does, and any error the sink
    /// returns, without trying further candidates.
    async fn ref_engines(
        &self,
        ctx: &Context,
        name: &str,
        sink: &mut dyn ReferenceSink,
    ) -> Result<Flow>;

    /// Release resources held by the engine.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
