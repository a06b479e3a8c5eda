//! unbundle - bundled resources as plain files
//!
//! Resolves logical resource names to paths on local storage. Resources
//! that only exist inside zip archives or behind module URIs are extracted
//! on demand into a disk cache, so they can be memory-mapped, streamed, or
//! handed to code that only accepts file paths.
//!
//! ```no_run
//! use unbundle::{FileResolver, ResolverOptions};
//!
//! # fn main() -> unbundle::UnbundleResult<()> {
//! let options = ResolverOptions {
//!     search_path: vec!["assets.zip".into()],
//!     ..ResolverOptions::from_env()
//! };
//! let resolver = FileResolver::new(&options)?;
//! let path = resolver.resolve_file("web/index.html")?;
//! if path.exists() {
//!     println!("serving {}", path.display());
//! }
//! resolver.close()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod resolver;

pub use cache::{FileCache, Transfer};
pub use config::ResolverOptions;
pub use error::{UnbundleError, UnbundleResult};
pub use provider::{Locator, ResourceProvider, SearchPath};
pub use resolver::{FileResolver, PathPolicy};
