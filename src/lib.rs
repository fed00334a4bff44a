//! ledger-index - per-ledger index file cache for storage nodes
//!
//! Keeps one open index file ("file info") per ledger, shared by every
//! concurrent reader and writer of that ledger, and closes it exactly once
//! when the last holder releases it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fileinfo;
pub mod ui;

pub use cache::{BackingCache, CacheStats, CachedFileInfo, FileInfoBackingCache, DEAD_REF};
pub use error::{LedgerError, LedgerResult};
pub use fileinfo::{DirectoryLoader, FileInfo, CURRENT_HEADER_VERSION};

/// Identifier of a ledger, unique for the lifetime of a storage node
pub type LedgerId = u64;
