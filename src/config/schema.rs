//! Configuration schema for unbundle
//!
//! Options are read once, when a resolver is constructed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Reuse extracted entries across calls. When disabled the cache is
    /// scratch space and every resolve re-materializes from the source.
    pub file_caching_enabled: bool,

    /// Resolve names through the resource provider. When disabled no cache
    /// is created and names resolve to their literal path.
    pub provider_resolving_enabled: bool,

    /// Base directory under which the per-resolver cache root is created
    pub cache_dir: Option<PathBuf>,

    /// Directory that relative names are resolved against, instead of the
    /// process working directory
    pub cwd: Option<PathBuf>,

    /// Directory and zip-archive roots searched by the default provider
    pub search_path: Vec<PathBuf>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            file_caching_enabled: true,
            provider_resolving_enabled: true,
            cache_dir: None,
            cwd: None,
            search_path: Vec::new(),
        }
    }
}
