//! Ref-engine discovery from local configuration files.
//!
//! Each file holds a JSON object mapping regular expressions to ref-engines
//! objects:
//!
//! ```json
//! {
//!   "^example\\.com/": {
//!     "refEngines": [{"protocol": "oci-index-template-v1", "uri": "https://example.com/index.json"}]
//!   }
//! }
//! ```
//!
//! Patterns are matched against the whole image name, not just the host,
//! and every matching pattern contributes, most specific first.

use std::collections::HashMap;
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use super::{priority, DiscoveryDocument, DiscoveryEngine, Flow, ReferenceSink};
use crate::defaults::{CONFIG_FILE_NAME, CONFIG_SUBDIR, XDG_CONFIG_DIRS};
use crate::error::{Error, Result};
use crate::fetch::Context;

/// A pattern's ref-engines object and the file that declared it.
#[derive(Debug, Clone)]
struct Entry {
    source: Url,
    document: DiscoveryDocument,
}

/// Discovery engine backed by regex-keyed local configuration.
#[derive(Debug, Clone)]
pub struct LocalConfigEngine {
    paths: Vec<PathBuf>,
}

impl LocalConfigEngine {
    /// Consult `paths` in order. When two files declare the same pattern the
    /// earlier file wins.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()])
    }

    /// The per-user config file followed by the system-wide ones.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut bases = Vec::new();

        match env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(home) => bases.push(PathBuf::from(home)),
            None => bases.extend(dirs::config_dir()),
        }

        let system = env::var("XDG_CONFIG_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| XDG_CONFIG_DIRS.to_string());
        bases.extend(system.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));

        bases
            .into_iter()
            .map(|dir| dir.join(CONFIG_SUBDIR).join(CONFIG_FILE_NAME))
            .collect()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Read every candidate file and merge their patterns.
    async fn load(&self, ctx: &Context) -> Result<HashMap<String, Entry>> {
        let mut merged = HashMap::new();

        for path in &self.paths {
            let (source, patterns) = match read_config(ctx, path).await {
                Ok(Some(loaded)) => loaded,
                Ok(None) => continue,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    log::warn!("skipping local config {}: {}", path.display(), e);
                    continue;
                }
            };

            log::debug!("loaded {} patterns from {}", patterns.len(), source);
            for (pattern, document) in patterns {
                merged.entry(pattern).or_insert_with(|| Entry {
                    source: source.clone(),
                    document,
                });
            }
        }

        Ok(merged)
    }
}

impl Default for LocalConfigEngine {
    fn default() -> Self {
        Self::new(Self::default_paths())
    }
}

/// Read one config file. `Ok(None)` means the file does not exist.
async fn read_config(
    ctx: &Context,
    path: &Path,
) -> Result<Option<(Url, HashMap<String, DiscoveryDocument>)>> {
    let source = file_uri(path)?;

    let bytes = match ctx.read_file(path).await {
        Ok(bytes) => bytes,
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            log::debug!("no local config at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let patterns = serde_json::from_slice(&bytes).map_err(|source_err| Error::Decode {
        uri: source.to_string(),
        source: source_err,
    })?;
    Ok(Some((source, patterns)))
}

fn file_uri(path: &Path) -> Result<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map_err(|()| Error::InvalidUri(format!("cannot express {} as a file URI", absolute.display())))
}

#[async_trait]
impl DiscoveryEngine for LocalConfigEngine {
    async fn ref_engines(
        &self,
        ctx: &Context,
        name: &str,
        sink: &mut dyn ReferenceSink,
    ) -> Result<Flow> {
        let entries = self.load(ctx).await?;

        let mut patterns: Vec<&str> = entries.keys().map(String::as_str).collect();
        priority::sort(&mut patterns);

        for pattern in patterns {
            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    log::warn!("skipping invalid local config pattern {:?}: {}", pattern, e);
                    continue;
                }
            };
            if !regex.is_match(name) {
                continue;
            }

            let entry = &entries[pattern];
            log::debug!("{} matched local config pattern {:?} from {}", name, pattern, entry.source);
            if entry.document.dispatch(ctx, &entry.source, sink).await?.is_stop() {
                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }
}
