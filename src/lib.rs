//! oci-discovery - ref-engine discovery and name resolution for host-based
//! OCI image names.
//!
//! A name such as `example.com/app#1.0` is resolved in two stages:
//! discovery engines find ref-engine configurations for it (from local
//! config files or the host's well-known URI), then ref-engines built from
//! those configurations map the name to Merkle roots.

mod defaults;
pub mod error;

pub mod discovery;
pub mod engine;
pub mod fetch;
pub mod name;
pub mod ref_engine;
pub mod resolve;
pub mod template;

pub use error::{Error, Result};

pub use defaults::{
    DESCRIPTOR_MEDIA_TYPE, INDEX_MEDIA_TYPE, REF_ENGINES_MEDIA_TYPE, REF_NAME_ANNOTATION,
    REGEXP_REF_ENGINES_MEDIA_TYPE, WELL_KNOWN_PATH,
};

pub use discovery::{
    DiscoveryDocument, DiscoveryEngine, Flow, LocalConfigEngine, RefEngineReference,
    ReferenceSink, WellKnownEngine,
};
pub use engine::{EngineConfig, EngineReference};
pub use fetch::{Context, HttpTransport, MemoryTransport, Request, Response, Transport};
pub use name::ParsedName;
pub use ref_engine::{
    Constructor, Descriptor, DummyEngine, Index, IndexTemplateEngine, MerkleRoot, RefEngine,
    RefEngineRegistry,
};
pub use resolve::{ResolvedRoot, Resolver, ResolverOptions};
pub use template::{TemplateError, UriTemplate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
