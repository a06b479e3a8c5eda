//! On-disk cache store
//!
//! Each store owns a process-unique root directory. Entries are addressed by
//! logical name with `/` separators and written atomically: bytes go to a
//! temporary file in the target directory which is then renamed into place,
//! so a reader never observes a partially written entry.

use crate::error::{UnbundleError, UnbundleResult};
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// Directory created under the system temp dir when no base is configured
pub const DEFAULT_CACHE_BASE: &str = "unbundle-cache";

/// Prefix of the per-store root directory name
const ROOT_PREFIX: &str = "file-cache-";

/// How bytes are transferred into an existing cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Copy into the cache, keeping an entry that already exists
    Copy,
    /// Move a fresh copy into place, replacing any existing entry
    Move,
}

/// Disk-backed cache of extracted resources
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create the cache root under `base_dir`, or under the system temp dir
    pub fn setup(base_dir: Option<&Path>) -> UnbundleResult<Self> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir().join(DEFAULT_CACHE_BASE),
        };
        let root = base.join(format!("{}{}", ROOT_PREFIX, Uuid::new_v4()));

        fs::create_dir_all(&root).map_err(|e| {
            UnbundleError::io(format!("creating cache directory {}", root.display()), e)
        })?;

        info!("File cache created at {}", root.display());
        Ok(Self { root })
    }

    /// Root directory of this cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the entry for `name` has (or would have). Performs no IO.
    pub fn get_file(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }

    /// Whether `name` addresses a path under the cache root
    pub fn contains(&self, name: &str) -> bool {
        self.entry_path(name).is_ok()
    }

    /// Existing entry for `name`, or `None` if there is none or the name
    /// climbs out of the cache root
    pub fn cached_entry(&self, name: &str) -> Option<PathBuf> {
        self.entry_path(name).ok().filter(|path| path.exists())
    }

    /// Cache a file or directory from the local filesystem.
    ///
    /// Directories are created empty; their children are cached separately.
    pub fn cache(&self, name: &str, source: &Path, transfer: Transfer) -> UnbundleResult<PathBuf> {
        let target = self.entry_path(name)?;

        if source.is_dir() {
            create_dir(&target)?;
            return Ok(target);
        }

        if transfer == Transfer::Copy && target.exists() {
            debug!("Keeping cached entry {}", name);
            return Ok(target);
        }

        let mut reader = fs::File::open(source)
            .map_err(|e| UnbundleError::io(format!("opening {}", source.display()), e))?;
        self.write_atomic(&target, &mut reader)?;
        debug!("Cached {} from {}", name, source.display());
        Ok(target)
    }

    /// Ensure an (empty) directory entry exists for `name`
    pub fn cache_dir(&self, name: &str) -> UnbundleResult<PathBuf> {
        let target = self.entry_path(name)?;
        create_dir(&target)?;
        Ok(target)
    }

    /// Stream `reader` into the entry for `name`
    pub fn cache_file(
        &self,
        name: &str,
        reader: &mut dyn Read,
        transfer: Transfer,
    ) -> UnbundleResult<PathBuf> {
        let target = self.entry_path(name)?;

        if transfer == Transfer::Copy && target.exists() {
            debug!("Keeping cached entry {}", name);
            return Ok(target);
        }

        self.write_atomic(&target, reader)?;
        debug!("Cached stream as {}", name);
        Ok(target)
    }

    /// Delete the cache root and everything below it. Blocking.
    pub fn close(&self) -> UnbundleResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                info!("File cache {} removed", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UnbundleError::io(
                format!("removing cache directory {}", self.root.display()),
                e,
            )),
        }
    }

    /// Resolve `name` under the root, rejecting names that climb out of it
    fn entry_path(&self, name: &str) -> UnbundleResult<PathBuf> {
        let relative = name.trim_start_matches('/');
        let mut depth: usize = 0;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir if depth > 0 => depth -= 1,
                _ => return Err(UnbundleError::PathEscapesCache(name.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }

    fn write_atomic(&self, target: &Path, reader: &mut dyn Read) -> UnbundleResult<()> {
        let parent = target.parent().unwrap_or(&self.root);
        create_dir(parent)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| {
            UnbundleError::io(format!("creating temporary file in {}", parent.display()), e)
        })?;
        io::copy(reader, tmp.as_file_mut())
            .map_err(|e| UnbundleError::io(format!("writing {}", target.display()), e))?;
        tmp.persist(target).map_err(|e| {
            UnbundleError::io(format!("moving entry into {}", target.display()), e.error)
        })?;
        Ok(())
    }
}

fn create_dir(path: &Path) -> UnbundleResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| UnbundleError::io(format!("creating directory {}", path.display()), e))
}
