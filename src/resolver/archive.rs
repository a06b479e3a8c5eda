//! Extraction from zip archive locators
//!
//! An archive locator looks like `jar:file:/srv/app.jar!/web/index.html`.
//! Two forms need extra care:
//!
//! - Nested archives, `jar:file:/app.jar!/lib/inner.jar!/a.txt`. The inner
//!   archive is itself resolved through the resolver (and so extracted to the
//!   cache) before it is opened.
//! - Entry prefixes, `jar:file:/app.jar!/classes!/a.txt`. Entries live under
//!   `classes/` in the archive but are cached without that prefix.

use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::locator::file_url_to_path;
use crate::provider::{Locator, ARCHIVE_ENTRY_SEP};
use crate::resolver::dispatch::Unpacker;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, trace};
use zip::ZipArchive;

/// Archive suffixes followed by the entry separator
const ARCHIVE_BOUNDARIES: &[&str] = &[".jar!/", ".zip!/"];

/// Length of an archive boundary marker
const BOUNDARY_LEN: usize = 6;

/// Length of the archive file suffix within a boundary marker
const SUFFIX_LEN: usize = 4;

/// Where the archive holding an entry comes from
#[derive(Debug, PartialEq, Eq)]
enum ArchiveSource<'a> {
    /// A `file:` URL of an archive on disk
    File(&'a str),
    /// Logical name of an archive inside another archive
    Nested(&'a str),
}

/// Parsed form of an archive locator
#[derive(Debug, PartialEq, Eq)]
struct ArchiveTarget<'a> {
    source: ArchiveSource<'a>,
    /// Entry name prefix stripped when caching, empty or ending with `/`
    prefix: String,
}

impl<'a> ArchiveTarget<'a> {
    /// Parse the scheme-specific part of a `jar:` locator
    fn parse(body: &'a str) -> Option<Self> {
        let inner = last_boundary(body, body.len())?;
        let archive_end = inner + SUFFIX_LEN;

        let source = match last_boundary(body, inner) {
            Some(outer) => ArchiveSource::Nested(&body[outer + BOUNDARY_LEN..archive_end]),
            None => ArchiveSource::File(&body[..archive_end]),
        };

        let segments: Vec<&str> = body[inner + BOUNDARY_LEN..]
            .split(ARCHIVE_ENTRY_SEP)
            .collect();
        let prefix = segments[..segments.len() - 1]
            .iter()
            .map(|segment| format!("{}/", segment))
            .collect();

        Some(Self { source, prefix })
    }
}

/// Start of the last archive boundary that ends within `body[..end]`.
/// Suffixes match regardless of ASCII case, as `SearchPath` roots do.
fn last_boundary(body: &str, end: usize) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact
    let haystack = body[..end].to_ascii_lowercase();
    ARCHIVE_BOUNDARIES
        .iter()
        .filter_map(|boundary| haystack.rfind(boundary))
        .max()
}

impl Unpacker<'_> {
    /// Extract the subtree `name` from the archive named by `locator`.
    ///
    /// Every entry under the requested name is extracted in one pass so that
    /// listing an extracted directory is complete.
    pub(super) fn unpack_archive(&self, locator: &Locator, name: &str) -> UnbundleResult<PathBuf> {
        let target = ArchiveTarget::parse(locator.scheme_specific())
            .ok_or_else(|| UnbundleError::invalid_locator(locator.as_str(), "no archive boundary"))?;

        let archive_path = match target.source {
            ArchiveSource::File(url) => file_url_to_path(url)?,
            ArchiveSource::Nested(inner) => {
                debug!("Resolving nested archive {}", inner);
                self.resolver
                    .resolve_locked(self.cache, inner, self.depth + 1)?
            }
        };

        let file = fs::File::open(&archive_path).map_err(|e| {
            UnbundleError::io(format!("opening archive {}", archive_path.display()), e)
        })?;
        let mut zip =
            ZipArchive::new(file).map_err(|e| UnbundleError::archive(&archive_path, e))?;

        let wanted = format!("{}{}", target.prefix, name);
        let transfer = self.resolver.transfer();
        let mut extracted = 0usize;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| UnbundleError::archive(&archive_path, e))?;
            let entry_name = entry.name().to_string();
            if !entry_name.starts_with(&wanted) {
                continue;
            }

            let relative = &entry_name[target.prefix.len()..];
            trace!("Extracting {} as {}", entry_name, relative);
            if entry_name.ends_with('/') {
                self.cache.cache_dir(relative)?;
            } else {
                self.cache.cache_file(relative, &mut entry, transfer)?;
            }
            extracted += 1;
        }

        debug!(
            "Extracted {} entries for {} from {}",
            extracted,
            name,
            archive_path.display()
        );
        Ok(self.cache.get_file(name))
    }
}
