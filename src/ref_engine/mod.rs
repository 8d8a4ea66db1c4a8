//! Ref-engines: pluggable protocols mapping image names to Merkle roots.

pub mod dummy;
pub mod index_template;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub use dummy::DummyEngine;
pub use index_template::{Descriptor, Index, IndexTemplateEngine};
pub use registry::{Constructor, RefEngineRegistry};

use crate::engine::EngineReference;
use crate::error::Result;
use crate::fetch::Context;

/// A resolved Merkle root and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRoot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Opaque to this crate; typically an image-spec descriptor.
    pub root: Value,
    /// Base for relative references inside `root`. Never fetched again.
    #[serde(rename = "uri", default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<Url>,
    /// CAS-engines the ref-engine suggests for this root in particular.
    #[serde(rename = "casEngines", default, skip_serializing_if = "Vec::is_empty")]
    pub cas_engines: Vec<EngineReference>,
}

/// A constructed ref-engine.
#[async_trait]
pub trait RefEngine: Send + Sync {
    /// Resolve `name` to zero or more Merkle roots.
    async fn get(&self, ctx: &Context, name: &str) -> Result<Vec<MerkleRoot>>;

    /// Release resources held by the engine.
    async fn close(&self) -> Result<()>;
}
