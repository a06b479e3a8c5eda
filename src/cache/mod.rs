//! Disk cache for extracted resources
//!
//! Resources that are not plain files (archive entries, module URIs) are
//! materialized here so callers can treat them as ordinary paths.
//!
//! # Entry Modes
//!
//! | Transfer | Existing entry | Used when |
//! |----------|----------------|-----------|
//! | Copy | kept | file caching enabled |
//! | Move | replaced | file caching disabled (cache is scratch space) |
//!
//! The cache root is deleted when the owning resolver is closed.

pub mod store;

pub use store::{FileCache, Transfer, DEFAULT_CACHE_BASE};
