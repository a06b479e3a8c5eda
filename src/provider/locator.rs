//! Scheme-tagged resource locators
//!
//! A locator is the external form a provider hands back for a logical name,
//! e.g. `file:///srv/web/index.html` or `jar:file:/srv/app.jar!/web/index.html`.

use crate::error::{UnbundleError, UnbundleResult};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Separator between an archive and the entry path inside it
pub const ARCHIVE_ENTRY_SEP: &str = "!/";

/// Scheme of locators produced for zip archive entries
pub const ARCHIVE_SCHEME: &str = "jar";

/// A resolved resource locator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    scheme: String,
    spec: String,
}

impl Locator {
    /// Parse a locator from its external form
    pub fn parse(spec: impl Into<String>) -> UnbundleResult<Self> {
        let spec = spec.into();
        let scheme = spec
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .filter(|scheme| is_valid_scheme(scheme))
            .map(str::to_ascii_lowercase);
        match scheme {
            Some(scheme) => Ok(Self { scheme, spec }),
            None => Err(UnbundleError::invalid_locator(spec, "missing scheme")),
        }
    }

    /// `file:` locator for an absolute filesystem path
    pub fn from_file_path(path: &Path) -> UnbundleResult<Self> {
        let url = Url::from_file_path(path).map_err(|()| {
            UnbundleError::invalid_locator(path.display().to_string(), "not an absolute path")
        })?;
        Ok(Self {
            scheme: "file".to_string(),
            spec: url.into(),
        })
    }

    /// `jar:` locator for `entry` inside the zip archive at `archive`
    pub fn archive_entry(archive: &Path, entry: &str) -> UnbundleResult<Self> {
        let archive = Self::from_file_path(archive)?;
        Ok(Self {
            scheme: ARCHIVE_SCHEME.to_string(),
            spec: format!(
                "{}:{}{}{}",
                ARCHIVE_SCHEME,
                archive.spec,
                ARCHIVE_ENTRY_SEP,
                entry.trim_start_matches('/')
            ),
        })
    }

    /// Lowercased scheme, without the trailing `:`
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything after `scheme:`
    pub fn scheme_specific(&self) -> &str {
        &self.spec[self.scheme.len() + 1..]
    }

    /// The full external form
    pub fn as_str(&self) -> &str {
        &self.spec
    }

    /// Decode a `file:` locator to a filesystem path
    pub fn to_file_path(&self) -> UnbundleResult<PathBuf> {
        file_url_to_path(&self.spec)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Percent-decode a `file:` URL into a filesystem path
pub(crate) fn file_url_to_path(spec: &str) -> UnbundleResult<PathBuf> {
    let url = Url::parse(spec).map_err(|e| UnbundleError::invalid_locator(spec, e.to_string()))?;
    if url.scheme() != "file" {
        return Err(UnbundleError::invalid_locator(spec, "expected a file: URL"));
    }
    url.to_file_path()
        .map_err(|()| UnbundleError::invalid_locator(spec, "not a local file path"))
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
