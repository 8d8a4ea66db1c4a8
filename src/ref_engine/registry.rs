//! Registry mapping ref-engine protocol identifiers to constructors.
//!
//! Populated once at start-up, then shared read-only (typically behind an
//! `Arc`) by every resolution.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use super::{dummy, index_template, RefEngine};
use crate::error::{Error, Result};

/// Builds a ref-engine from the URI of the declaring document and the
/// protocol-specific configuration data.
pub type Constructor = Box<dyn Fn(&Url, &Value) -> Result<Box<dyn RefEngine>> + Send + Sync>;

/// Protocol identifier to constructor table.
#[derive(Default)]
pub struct RefEngineRegistry {
    constructors: HashMap<String, Constructor>,
}

impl RefEngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in protocols.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(index_template::PROTOCOL, |base, data| {
            Ok(Box::new(index_template::IndexTemplateEngine::new(base, data)?) as Box<dyn RefEngine>)
        });
        registry.register(dummy::PROTOCOL, |base, data| {
            Ok(Box::new(dummy::DummyEngine::new(base, data)?) as Box<dyn RefEngine>)
        });
        registry
    }

    /// Register a constructor, replacing any previous one for `protocol`.
    pub fn register<F>(&mut self, protocol: impl Into<String>, constructor: F)
    where
        F: Fn(&Url, &Value) -> Result<Box<dyn RefEngine>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(protocol.into(), Box::new(constructor));
    }

    pub fn contains(&self, protocol: &str) -> bool {
        self.constructors.contains_key(protocol)
    }

    /// Registered protocols, sorted.
    pub fn protocols(&self) -> Vec<&str> {
        let mut protocols: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        protocols.sort_unstable();
        protocols
    }

    /// Construct a ref-engine for `protocol`.
    ///
    /// Returns `Error::UnsupportedProtocol` when nothing is registered, or
    /// whatever configuration error the constructor raises.
    pub fn construct(&self, protocol: &str, base: &Url, data: &Value) -> Result<Box<dyn RefEngine>> {
        let constructor = self
            .constructors
            .get(protocol)
            .ok_or_else(|| Error::UnsupportedProtocol(protocol.to_string()))?;
        constructor(base, data)
    }
}

impl std::fmt::Debug for RefEngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefEngineRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}
