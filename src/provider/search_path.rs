//! Search-path resource provider
//!
//! Resolves logical names against an ordered list of roots. A root is either
//! a directory or a zip archive (`.zip` / `.jar`); the first root holding the
//! name wins. Archive roots are indexed once, when the search path is built.

use crate::error::{UnbundleError, UnbundleResult};
use crate::provider::locator::{file_url_to_path, ARCHIVE_ENTRY_SEP, ARCHIVE_SCHEME};
use crate::provider::{Locator, ResourceProvider};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// File extensions treated as zip archive roots
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "jar"];

/// A single root of the search path
#[derive(Debug)]
enum Root {
    Directory(PathBuf),
    Archive(ArchiveIndex),
}

/// Entry names of an archive, including implicit parent directories
#[derive(Debug)]
struct ArchiveIndex {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl ArchiveIndex {
    fn load(path: PathBuf) -> UnbundleResult<Self> {
        let file = fs::File::open(&path)
            .map_err(|e| UnbundleError::io(format!("opening archive {}", path.display()), e))?;
        let archive = ZipArchive::new(file).map_err(|e| UnbundleError::archive(&path, e))?;

        let mut entries = BTreeSet::new();
        for name in archive.file_names() {
            for (idx, _) in name.match_indices('/') {
                entries.insert(name[..=idx].to_string());
            }
            entries.insert(name.to_string());
        }

        debug!("Indexed {} entries in {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    fn contains(&self, name: &str) -> bool {
        if name.ends_with('/') {
            self.entries.contains(name)
        } else {
            self.entries.contains(name) || self.entries.contains(&format!("{}/", name))
        }
    }
}

/// Provider over an ordered list of directory and archive roots
#[derive(Debug)]
pub struct SearchPath {
    roots: Vec<Root>,
}

impl SearchPath {
    /// Build a search path. Missing roots are skipped, as are files that are
    /// not recognized archives.
    pub fn new<I, P>(roots: I) -> UnbundleResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolved = Vec::new();

        for root in roots {
            let root = std::path::absolute(root.as_ref()).map_err(|e| {
                UnbundleError::io(format!("resolving root {}", root.as_ref().display()), e)
            })?;

            if root.is_dir() {
                resolved.push(Root::Directory(root));
            } else if root.is_file() && is_archive(&root) {
                resolved.push(Root::Archive(ArchiveIndex::load(root)?));
            } else if root.exists() {
                warn!("Ignoring search path root {}: not a directory or archive", root.display());
            } else {
                debug!("Skipping missing search path root {}", root.display());
            }
        }

        Ok(Self { roots: resolved })
    }

    /// Number of usable roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether no root is usable
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl ResourceProvider for SearchPath {
    fn resolve(&self, name: &str) -> Option<Locator> {
        if !is_contained(name) {
            return None;
        }

        self.roots.iter().find_map(|root| match root {
            Root::Directory(dir) => {
                let candidate = dir.join(name);
                let found = if name.ends_with('/') {
                    candidate.is_dir()
                } else {
                    candidate.exists()
                };
                if !found {
                    return None;
                }
                let locator = Locator::from_file_path(&candidate).ok()?;
                // Keep the directory signal visible in the external form
                if name.ends_with('/') && !locator.as_str().ends_with('/') {
                    return Locator::parse(format!("{}/", locator)).ok();
                }
                Some(locator)
            }
            Root::Archive(index) if index.contains(name) => {
                Locator::archive_entry(&index.path, name).ok()
            }
            Root::Archive(_) => None,
        })
    }

    fn open_stream(&self, locator: &Locator) -> io::Result<Box<dyn Read + Send>> {
        match locator.scheme() {
            "file" => {
                let path = locator.to_file_path().map_err(io::Error::other)?;
                Ok(Box::new(fs::File::open(path)?))
            }
            ARCHIVE_SCHEME => {
                let (archive, entry) = locator
                    .scheme_specific()
                    .split_once(ARCHIVE_ENTRY_SEP)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!("no archive entry in {}", locator),
                        )
                    })?;
                let path = file_url_to_path(archive).map_err(io::Error::other)?;
                let mut zip = ZipArchive::new(fs::File::open(path)?).map_err(io::Error::other)?;
                let mut file = zip.by_name(entry).map_err(io::Error::other)?;

                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(Box::new(Cursor::new(buf)))
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot open {} locators", other),
            )),
        }
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Names must stay inside their root
fn is_contained(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
