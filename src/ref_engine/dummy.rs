//! The `_dummy` ref-engine, which answers every name with a fixed response.
//!
//! Useful for exercising discovery and resolution without touching the
//! network: `{"protocol": "_dummy", "response": [{"root": ...}]}`.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::{MerkleRoot, RefEngine};
use crate::error::{Error, Result};
use crate::fetch::Context;

pub const PROTOCOL: &str = "_dummy";

#[derive(Debug, Clone)]
pub struct DummyEngine {
    response: Vec<MerkleRoot>,
}

impl DummyEngine {
    pub fn new(_base: &Url, config: &Value) -> Result<Self> {
        let response = config.get("response").ok_or_else(|| {
            Error::Config(format!("dummy config missing required 'response' property: {config}"))
        })?;

        let response = serde_json::from_value(response.clone()).map_err(|e| {
            Error::Config(format!("dummy config 'response' is not a list of Merkle roots: {e}"))
        })?;

        Ok(Self { response })
    }
}

#[async_trait]
impl RefEngine for DummyEngine {
    async fn get(&self, ctx: &Context, _name: &str) -> Result<Vec<MerkleRoot>> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self.response.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
