//! Extraction from stream-only module URIs
//!
//! Module runtimes hand out locators that can only be opened as streams:
//! there is no listing and no reliable directory flag. A locator is taken to
//! be a directory when its external form ends with `/`, when the provider
//! also resolves the name with a trailing `/`, or when the caller says so.
//! This heuristic can misclassify; for example a provider that resolves any
//! name with a trailing `/` makes every file look like a directory.

use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::Locator;
use crate::resolver::dispatch::Unpacker;
use std::path::PathBuf;

impl Unpacker<'_> {
    pub(super) fn unpack_module_uri(
        &self,
        locator: &Locator,
        name: &str,
        is_dir: bool,
    ) -> UnbundleResult<PathBuf> {
        if is_dir || self.looks_like_directory(locator, name) {
            return self.cache.cache_dir(name);
        }

        let mut stream = self
            .resolver
            .provider
            .open_stream(locator)
            .map_err(|e| UnbundleError::io(format!("opening stream for {}", locator), e))?;
        self.cache
            .cache_file(name, &mut stream, self.resolver.transfer())
    }

    fn looks_like_directory(&self, locator: &Locator, name: &str) -> bool {
        if locator.as_str().ends_with('/') {
            return true;
        }
        let dir_name = format!("{}/", name.trim_end_matches('/'));
        self.resolver.lookup(&dir_name).is_some()
    }
}
