//! Locator dispatch
//!
//! Routes a resolved locator to the extraction strategy for its scheme.

use crate::cache::FileCache;
use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::{Locator, ARCHIVE_SCHEME};
use crate::resolver::FileResolver;
use std::path::PathBuf;
use tracing::debug;

/// Stream-only schemes from modular runtimes: OSGi bundles (Felix,
/// Knopflerfish, Equinox) and native-image resources
pub const MODULE_SCHEMES: &[&str] = &["bundle", "bundleentry", "bundleresource", "resource"];

/// Extraction strategy for a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Directly addressable file or directory
    Plain,
    /// Entry inside a zip archive, possibly nested
    Archive,
    /// Stream-only module URI
    ModuleUri,
}

impl Route {
    /// Pick the route for a locator's scheme
    pub fn for_locator(locator: &Locator) -> UnbundleResult<Self> {
        match locator.scheme() {
            "file" => Ok(Self::Plain),
            ARCHIVE_SCHEME => Ok(Self::Archive),
            scheme if MODULE_SCHEMES.contains(&scheme) => Ok(Self::ModuleUri),
            scheme => Err(UnbundleError::UnsupportedScheme {
                scheme: scheme.to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}

/// Extraction context for one resolve call, valid while the resolver lock
/// is held
pub(crate) struct Unpacker<'a> {
    pub(super) resolver: &'a FileResolver,
    pub(super) cache: &'a FileCache,
    pub(super) depth: usize,
}

impl<'a> Unpacker<'a> {
    pub(crate) fn new(resolver: &'a FileResolver, cache: &'a FileCache, depth: usize) -> Self {
        Self {
            resolver,
            cache,
            depth,
        }
    }

    /// Materialize `locator` into the cache as `name`.
    ///
    /// `is_dir` is a hint from the caller that the name is a directory.
    pub(crate) fn unpack(
        &self,
        locator: &Locator,
        name: &str,
        is_dir: bool,
    ) -> UnbundleResult<PathBuf> {
        let route = Route::for_locator(locator)?;
        debug!("Unpacking {} from {} ({:?})", name, locator, route);

        match route {
            Route::Plain => self.unpack_plain(locator, name),
            Route::Archive => self.unpack_archive(locator, name),
            Route::ModuleUri => self.unpack_module_uri(locator, name, is_dir),
        }
    }
}
