//! Resource providers
//!
//! A provider maps logical names to locators and opens byte streams for
//! them. The resolver only consumes this contract; [`SearchPath`] is the
//! provider used when none is supplied explicitly.

pub mod locator;
pub mod search_path;

pub use locator::{Locator, ARCHIVE_ENTRY_SEP, ARCHIVE_SCHEME};
pub use search_path::SearchPath;

use std::io::{self, Read};
use std::sync::Arc;

/// Lookup capability from logical names to resource bytes
pub trait ResourceProvider: Send + Sync {
    /// Resolve a logical name, or `None` if the provider has no such resource.
    ///
    /// A trailing `/` asks specifically for a directory.
    fn resolve(&self, name: &str) -> Option<Locator>;

    /// Open a byte stream for a locator previously returned by `resolve`
    fn open_stream(&self, locator: &Locator) -> io::Result<Box<dyn Read + Send>>;
}

/// Pick the first available provider from an ordered list of candidates.
///
/// The list is evaluated once; later candidates are fallbacks.
pub fn select_provider<I>(candidates: I) -> Option<Arc<dyn ResourceProvider>>
where
    I: IntoIterator<Item = Option<Arc<dyn ResourceProvider>>>,
{
    candidates.into_iter().flatten().next()
}
