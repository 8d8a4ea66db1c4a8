//! The `oci-index-template-v1` ref-engine.
//!
//! The engine expands a URI Template against the parsed image name,
//! resolves the result against the URI of the document that declared the
//! engine, and fetches an image index from there. Index entries are
//! filtered by the name's fragment using the ref-name annotation.
//!
//! Simple `{path}` expansion percent-encodes `/`; templates that want a
//! multi-segment path verbatim should use `{+path}`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::{MerkleRoot, RefEngine};
use crate::defaults::{DESCRIPTOR_MEDIA_TYPE, INDEX_MEDIA_TYPE, REF_NAME_ANNOTATION};
use crate::error::{Error, Result};
use crate::fetch::{fetch_json, Context};
use crate::name::{self, ParsedName};
use crate::template::UriTemplate;

pub const PROTOCOL: &str = "oci-index-template-v1";

/// An image-spec content descriptor.
///
/// Fields this crate does not interpret are kept in `extra` so the
/// descriptor survives a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default)]
    pub size: i64,
    /// `None` only when the document carried no `annotations` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Descriptor {
    /// The `org.opencontainers.image.ref.name` annotation, if any.
    pub fn ref_name(&self) -> Option<&str> {
        self.annotations
            .as_ref()?
            .get(REF_NAME_ANNOTATION)
            .map(String::as_str)
    }
}

/// An image index (`application/vnd.oci.image.index.v1+json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

/// Ref-engine implementing the OCI index template protocol.
#[derive(Debug, Clone)]
pub struct IndexTemplateEngine {
    template: UriTemplate,
    base: Url,
}

impl IndexTemplateEngine {
    /// Create an engine from its configuration data.
    ///
    /// `config` must be an object with a string `uri` holding a URI
    /// Template.
    pub fn new(base: &Url, config: &Value) -> Result<Self> {
        let config_map = config.as_object().ok_or_else(|| {
            Error::Config(format!("index template config is not a map: {config}"))
        })?;

        let uri = config_map.get("uri").ok_or_else(|| {
            Error::Config(format!(
                "index template config missing required 'uri' property: {config}"
            ))
        })?;

        let uri = uri.as_str().ok_or_else(|| {
            Error::Config(format!("index template config 'uri' is not a string: {uri}"))
        })?;

        Ok(Self {
            template: UriTemplate::parse(uri)?,
            base: base.clone(),
        })
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    /// The index URI for a parsed name.
    pub fn resolve_uri(&self, name: &ParsedName) -> Result<Url> {
        let reference = self.template.expand(&name.variables())?;
        Ok(self.base.join(&reference)?)
    }

    /// Wrap the index entries matching `name` as Merkle roots.
    ///
    /// `uri` is recorded as provenance. It is the requested URI, not the
    /// URI reached after any redirects.
    fn merkle_roots(&self, index: Index, uri: &Url, name: &ParsedName) -> Result<Vec<MerkleRoot>> {
        index
            .manifests
            .into_iter()
            .filter(|descriptor| {
                name.fragment.is_empty() || descriptor.ref_name() == Some(name.fragment.as_str())
            })
            .map(|descriptor| {
                let root = serde_json::to_value(&descriptor).map_err(|source| Error::Decode {
                    uri: uri.to_string(),
                    source,
                })?;
                Ok(MerkleRoot {
                    media_type: Some(DESCRIPTOR_MEDIA_TYPE.to_string()),
                    root,
                    source_uri: Some(uri.clone()),
                    cas_engines: Vec::new(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl RefEngine for IndexTemplateEngine {
    async fn get(&self, ctx: &Context, name: &str) -> Result<Vec<MerkleRoot>> {
        let parsed = name::parse(name)?;
        let uri = self.resolve_uri(&parsed)?;

        log::debug!("fetching an OCI index for {} from {}", name, uri);
        let index: Index = fetch_json(ctx, &uri, INDEX_MEDIA_TYPE).await?;
        log::debug!("received {} manifests from {}", index.manifests.len(), uri);

        self.merkle_roots(index, &uri, &parsed)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
