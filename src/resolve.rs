//! Resolution: discovery engines feeding ref-engines feeding the caller.
//!
//! Discovery engines run in order. Every ref-engine reference they find is
//! constructed through the registry and asked for the name's Merkle roots,
//! which are handed to the caller as they arrive. Failures of a single
//! candidate are logged and skipped. Cancellation and caller errors abort.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::discovery::{
    DiscoveryEngine, Flow, LocalConfigEngine, RefEngineReference, ReferenceSink, WellKnownEngine,
};
use crate::engine::EngineReference;
use crate::error::{Error, Result};
use crate::fetch::Context;
use crate::name;
use crate::ref_engine::{MerkleRoot, RefEngine, RefEngineRegistry};

/// Options for building a [`Resolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Transport protocols for well-known discovery, in preference order
    #[serde(default = "defaults::protocols")]
    pub protocols: Vec<String>,

    /// Port for well-known URIs instead of the protocol default
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "defaults::enabled")]
    pub well_known: bool,

    #[serde(default = "defaults::enabled")]
    pub local_config: bool,

    /// Local config files; empty means the XDG defaults
    #[serde(default)]
    pub config_paths: Vec<PathBuf>,

    /// Per-request HTTP timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ResolverOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            protocols: defaults::protocols(),
            port: None,
            well_known: defaults::enabled(),
            local_config: defaults::enabled(),
            config_paths: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// A Merkle root and every CAS-engine suggested for it.
///
/// `cas_engines` holds the root's own suggestions followed by those of the
/// document that declared its ref-engine. `root.cas_engines` is left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoot {
    #[serde(flatten)]
    pub root: MerkleRoot,
    #[serde(rename = "casEngines", default, skip_serializing_if = "Vec::is_empty")]
    pub cas_engines: Vec<EngineReference>,
}

/// Drives discovery engines and ref-engines for image names.
pub struct Resolver {
    registry: Arc<RefEngineRegistry>,
    engines: Vec<Box<dyn DiscoveryEngine>>,
}

impl Resolver {
    /// Create a resolver with no discovery engines.
    pub fn new(registry: Arc<RefEngineRegistry>) -> Self {
        Self {
            registry,
            engines: Vec::new(),
        }
    }

    /// Append a discovery engine. Engines run in the order they are added.
    pub fn with_engine(mut self, engine: impl DiscoveryEngine + 'static) -> Self {
        self.engines.push(Box::new(engine));
        self
    }

    /// Build the standard engine list: local config first, then well-known.
    pub fn from_options(registry: Arc<RefEngineRegistry>, options: &ResolverOptions) -> Self {
        let mut resolver = Self::new(registry);

        if options.local_config {
            let paths = if options.config_paths.is_empty() {
                LocalConfigEngine::default_paths()
            } else {
                options.config_paths.clone()
            };
            resolver = resolver.with_engine(LocalConfigEngine::new(paths));
        }

        if options.well_known {
            resolver = resolver
                .with_engine(WellKnownEngine::new(options.protocols.clone()).with_port(options.port));
        }

        resolver
    }

    pub fn registry(&self) -> &RefEngineRegistry {
        &self.registry
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Resolve `name`, handing each Merkle root to `on_resolved` as found.
    ///
    /// Returns once every engine is exhausted or `on_resolved` returns
    /// `Flow::Stop`. Finding nothing is not an error.
    pub async fn resolve<F>(&self, ctx: &Context, name: &str, mut on_resolved: F) -> Result<()>
    where
        F: FnMut(ResolvedRoot) -> Result<Flow> + Send,
    {
        name::parse(name)?;

        let mut sink = ResolveSink {
            registry: &self.registry,
            name,
            on_resolved: &mut on_resolved,
        };

        for engine in &self.engines {
            if engine.ref_engines(ctx, name, &mut sink).await?.is_stop() {
                log::debug!("resolution of {} stopped by caller", name);
                return Ok(());
            }
        }

        Ok(())
    }

    /// Resolve `name` and collect every Merkle root.
    pub async fn resolve_all(&self, ctx: &Context, name: &str) -> Result<Vec<ResolvedRoot>> {
        let mut roots = Vec::new();
        self.resolve(ctx, name, |root| {
            roots.push(root);
            Ok(Flow::Continue)
        })
        .await?;
        Ok(roots)
    }

    /// Collect the ref-engine references every discovery engine finds for
    /// `name`, without constructing any of them.
    pub async fn discover(&self, ctx: &Context, name: &str) -> Result<Vec<RefEngineReference>> {
        name::parse(name)?;

        let mut references: Vec<RefEngineReference> = Vec::new();
        for engine in &self.engines {
            engine.ref_engines(ctx, name, &mut references).await?;
        }
        Ok(references)
    }

    /// Close every discovery engine, reporting the first failure.
    pub async fn close(&self) -> Result<()> {
        let mut first_error = None;
        for engine in &self.engines {
            if let Err(e) = engine.close().await {
                log::warn!("failed to close discovery engine: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("engines", &self.engines.len())
            .finish()
    }
}

/// Turns discovered references into resolved roots.
struct ResolveSink<'a, F> {
    registry: &'a RefEngineRegistry,
    name: &'a str,
    on_resolved: &'a mut F,
}

impl<'a, F> ResolveSink<'a, F> {
    fn construct(&self, reference: &EngineReference) -> Option<Box<dyn RefEngine>> {
        let protocol = reference.protocol();
        match self
            .registry
            .construct(protocol, &reference.source_uri, &reference.config.data_value())
        {
            Ok(engine) => Some(engine),
            Err(Error::UnsupportedProtocol(_)) => {
                log::debug!("unsupported ref-engine protocol {:?} from {}", protocol, reference.source_uri);
                None
            }
            Err(e) => {
                log::warn!("failed to construct {} ref-engine from {}: {}", protocol, reference.source_uri, e);
                None
            }
        }
    }
}

async fn close_engine(engine: &dyn RefEngine) {
    if let Err(e) = engine.close().await {
        log::warn!("failed to close ref-engine: {}", e);
    }
}

#[async_trait]
impl<'a, F> ReferenceSink for ResolveSink<'a, F>
where
    F: FnMut(ResolvedRoot) -> Result<Flow> + Send,
{
    async fn on_reference(&mut self, ctx: &Context, reference: RefEngineReference) -> Result<Flow> {
        let Some(engine) = self.construct(&reference.engine) else {
            return Ok(Flow::Continue);
        };

        let result = engine.get(ctx, self.name).await;
        close_engine(engine.as_ref()).await;

        let roots = match result {
            Ok(roots) => roots,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                log::warn!(
                    "{} ref-engine from {} failed to resolve {}: {}",
                    reference.engine.protocol(),
                    reference.engine.source_uri,
                    self.name,
                    e
                );
                return Ok(Flow::Continue);
            }
        };

        log::debug!(
            "{} ref-engine from {} found {} roots for {}",
            reference.engine.protocol(),
            reference.engine.source_uri,
            roots.len(),
            self.name
        );
        for mut root in roots {
            let mut cas_engines = std::mem::take(&mut root.cas_engines);
            cas_engines.extend(reference.cas_engines.iter().cloned());
            let resolved = ResolvedRoot { root, cas_engines };
            if (self.on_resolved)(resolved)?.is_stop() {
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }
}
