//! Engine configurations paired with the document that declared them.

use serde::{Deserialize, Serialize};
use url::Url;

use super::config::EngineConfig;

/// An engine configuration and the URI of the document that declared it.
///
/// `source_uri` is the base for any relative reference inside the
/// configuration, even when the configuration names some other URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReference {
    pub config: EngineConfig,
    #[serde(rename = "uri")]
    pub source_uri: Url,
}

impl EngineReference {
    pub fn new(config: EngineConfig, source_uri: Url) -> Self {
        Self { config, source_uri }
    }

    pub fn protocol(&self) -> &str {
        &self.config.protocol
    }
}
