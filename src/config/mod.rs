//! Configuration management for unbundle
//!
//! Options come from defaults, an optional TOML file, and environment
//! overrides, applied in that order.

pub mod schema;

pub use schema::ResolverOptions;

use crate::error::{UnbundleError, UnbundleResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Disables reuse of extracted entries when set to a true value
pub const ENV_DISABLE_FILE_CACHING: &str = "UNBUNDLE_DISABLE_FILE_CACHING";

/// Disables provider resolution (and the cache) when set to a true value
pub const ENV_DISABLE_PROVIDER_RESOLVING: &str = "UNBUNDLE_DISABLE_PROVIDER_RESOLVING";

/// Overrides the cache base directory
pub const ENV_CACHE_DIR_BASE: &str = "UNBUNDLE_CACHE_DIR_BASE";

/// Overrides the directory relative names are resolved against
pub const ENV_CWD: &str = "UNBUNDLE_CWD";

impl ResolverOptions {
    /// Load options from a TOML file, using defaults if it does not exist
    pub fn load(path: &Path) -> UnbundleResult<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| UnbundleError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| UnbundleError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Default options with environment overrides applied
    pub fn from_env() -> Self {
        let mut options = Self::default();
        options.apply_env();
        options
    }

    /// Apply `UNBUNDLE_*` environment overrides on top of these options
    pub fn apply_env(&mut self) {
        if env_flag(ENV_DISABLE_FILE_CACHING) {
            debug!("File caching disabled via {}", ENV_DISABLE_FILE_CACHING);
            self.file_caching_enabled = false;
        }
        if env_flag(ENV_DISABLE_PROVIDER_RESOLVING) {
            debug!(
                "Provider resolving disabled via {}",
                ENV_DISABLE_PROVIDER_RESOLVING
            );
            self.provider_resolving_enabled = false;
        }
        if let Some(dir) = env_path(ENV_CACHE_DIR_BASE) {
            self.cache_dir = Some(dir);
        }
        if let Some(dir) = env_path(ENV_CWD) {
            self.cwd = Some(dir);
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
