//! Resource resolution
//!
//! Resolves logical names to paths on disk. A name that exists as a plain
//! file wins; otherwise the resource provider is asked for it and the
//! resource is materialized into the file cache:
//! 1. Literal path on disk (relative to the working-directory override)
//! 2. Existing cache entry (when file caching is enabled)
//! 3. Provider lookup, then extraction by locator scheme
//!
//! A name nothing knows about resolves to its literal path, which the caller
//! is expected to check for existence.

mod archive;
mod dispatch;
mod module_uri;
mod plain;
pub mod validate;

pub use dispatch::{Route, MODULE_SCHEMES};
pub use validate::PathPolicy;

use crate::cache::{FileCache, Transfer};
use crate::config::ResolverOptions;
use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::{select_provider, Locator, ResourceProvider, SearchPath};
use dispatch::Unpacker;
use std::borrow::Cow;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Maximum depth of recursive resolution (archives nested in archives)
pub const MAX_NESTING_DEPTH: usize = 8;

/// Resolves logical resource names to files, extracting into a cache
pub struct FileResolver {
    cwd: Option<PathBuf>,
    provider: Arc<dyn ResourceProvider>,
    caching_enabled: bool,
    cache: Option<Arc<FileCache>>,
    owns_cache: bool,
    policy: PathPolicy,
    lock: Mutex<()>,
}

impl FileResolver {
    /// Create a resolver using the default provider chain
    pub fn new(options: &ResolverOptions) -> UnbundleResult<Self> {
        Self::with_provider(options, None)
    }

    /// Create a resolver, preferring `provider` over the default chain.
    ///
    /// Provider fallback order, evaluated once:
    /// 1. The explicit provider
    /// 2. A search path over `options.search_path`, if configured
    /// 3. A search path over the process working directory
    pub fn with_provider(
        options: &ResolverOptions,
        provider: Option<Arc<dyn ResourceProvider>>,
    ) -> UnbundleResult<Self> {
        let configured = if provider.is_none() && !options.search_path.is_empty() {
            Some(Arc::new(SearchPath::new(&options.search_path)?) as Arc<dyn ResourceProvider>)
        } else {
            None
        };
        let provider = match select_provider([provider, configured]) {
            Some(provider) => provider,
            None => working_dir_search_path()?,
        };

        let cwd = options
            .cwd
            .as_deref()
            .map(std::path::absolute)
            .transpose()
            .map_err(|e| UnbundleError::io("resolving working directory override", e))?;

        let cache = if options.provider_resolving_enabled {
            Some(Arc::new(FileCache::setup(options.cache_dir.as_deref())?))
        } else {
            debug!("Provider resolving disabled, names resolve to literal paths");
            None
        };

        Ok(Self {
            cwd,
            provider,
            caching_enabled: options.file_caching_enabled,
            owns_cache: cache.is_some(),
            cache,
            policy: PathPolicy::for_host(),
            lock: Mutex::new(()),
        })
    }

    /// Replace the cache path policy
    pub fn path_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A resolver bound to another provider that shares this resolver's
    /// cache. The derived resolver never deletes the shared cache.
    pub fn derive(&self, provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            cwd: self.cwd.clone(),
            provider,
            caching_enabled: self.caching_enabled,
            cache: self.cache.clone(),
            owns_cache: false,
            policy: self.policy,
            lock: Mutex::new(()),
        }
    }

    /// The cache this resolver extracts into, if provider resolving is enabled
    pub fn cache(&self) -> Option<&FileCache> {
        self.cache.as_deref()
    }

    /// Delete the cache if this resolver created it. Blocking.
    pub fn close(&self) -> UnbundleResult<()> {
        match &self.cache {
            Some(cache) if self.owns_cache => cache.close(),
            _ => Ok(()),
        }
    }

    /// Resolve `name` to a path.
    ///
    /// Never fails for a missing resource: the literal path is returned and
    /// may not exist. Errors report IO failures during extraction or a
    /// provider that broke its contract.
    pub fn resolve_file(&self, name: &str) -> UnbundleResult<PathBuf> {
        let Some(cache) = self.cache.as_deref() else {
            return Ok(self.literal_candidate(name));
        };

        // Serialize extraction so two callers never write the same entry
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.resolve_locked(cache, name, 0)
    }

    /// Resolution with the lock already held. Re-entered for nested archives.
    fn resolve_locked(&self, cache: &FileCache, name: &str, depth: usize) -> UnbundleResult<PathBuf> {
        if depth > MAX_NESTING_DEPTH {
            return Err(UnbundleError::NestingTooDeep {
                name: name.to_string(),
                depth,
            });
        }

        let file = self.literal_candidate(name);
        if file.exists() {
            return Ok(file);
        }

        let name = canonical_separators(name);
        if !cache.contains(&name) {
            debug!("{} escapes the cache root, using literal path", name);
            return Ok(file);
        }
        if self.caching_enabled {
            if let Some(cached) = cache.cached_entry(&name) {
                debug!("Cache hit for {}", name);
                return Ok(cached);
            }
        }

        let unpacker = Unpacker::new(self, cache, depth);

        // Unpack the parent first so the directory lists completely later
        if let Some(parent) = logical_parent(&name) {
            if let Some(locator) = self.lookup(parent) {
                unpacker.unpack(&locator, parent, true)?;
            }
        }

        match self.lookup(&name) {
            Some(locator) => unpacker.unpack(&locator, &name, false),
            None => {
                debug!("{} not found, using literal path", name);
                Ok(file)
            }
        }
    }

    /// Provider lookup restricted to names the cache can represent
    fn lookup(&self, name: &str) -> Option<Locator> {
        let locator = self.provider.resolve(name)?;
        if !self.policy.is_valid(name) {
            debug!("Rejecting {}: not a valid cache path", name);
            return None;
        }
        Some(locator)
    }

    fn transfer(&self) -> Transfer {
        if self.caching_enabled {
            Transfer::Copy
        } else {
            Transfer::Move
        }
    }

    fn literal_candidate(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match &self.cwd {
            Some(cwd) if path.is_relative() => cwd.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl std::fmt::Debug for FileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResolver")
            .field("cwd", &self.cwd)
            .field("caching_enabled", &self.caching_enabled)
            .field("cache", &self.cache)
            .field("owns_cache", &self.owns_cache)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn working_dir_search_path() -> UnbundleResult<Arc<dyn ResourceProvider>> {
    let cwd = std::env::current_dir()
        .map_err(|e| UnbundleError::io("reading process working directory", e))?;
    Ok(Arc::new(SearchPath::new([cwd])?))
}

/// Names use `/` internally whatever the host separator
fn canonical_separators(name: &str) -> Cow<'_, str> {
    if MAIN_SEPARATOR == '/' {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.replace(MAIN_SEPARATOR, "/"))
    }
}

fn logical_parent(name: &str) -> Option<&str> {
    name.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
}
