//! Extraction from `file:` locators

use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::Locator;
use crate::resolver::dispatch::Unpacker;
use std::fs;
use std::path::PathBuf;
use tracing::trace;

impl Unpacker<'_> {
    /// Copy a file, or a directory tree, into the cache.
    ///
    /// Every child of a directory is re-resolved through the provider so the
    /// cached tree mirrors what the provider exposes.
    pub(super) fn unpack_plain(&self, locator: &Locator, name: &str) -> UnbundleResult<PathBuf> {
        let resource = locator.to_file_path()?;
        let cached = self
            .cache
            .cache(name, &resource, self.resolver.transfer())?;

        if !resource.is_dir() {
            return Ok(cached);
        }

        let listing = fs::read_dir(&resource)
            .map_err(|e| UnbundleError::io(format!("listing {}", resource.display()), e))?;
        let base = name.trim_end_matches('/');

        for entry in listing {
            let entry = entry
                .map_err(|e| UnbundleError::io(format!("listing {}", resource.display()), e))?;
            let file_name = entry.file_name();
            let child = match file_name.to_str() {
                Some(child) => format!("{}/{}", base, child),
                None => {
                    return Err(UnbundleError::InconsistentListing(format!(
                        "{}/{}",
                        base,
                        file_name.to_string_lossy()
                    )))
                }
            };

            trace!("Unpacking directory child {}", child);
            let child_locator = self
                .resolver
                .lookup(&child)
                .ok_or_else(|| UnbundleError::InconsistentListing(child.clone()))?;
            self.unpack_plain(&child_locator, &child)?;
        }

        Ok(cached)
    }
}
