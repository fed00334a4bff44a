//! Reference-counted backing cache for ledger index files
//!
//! Every ledger has at most one live [`CachedFileInfo`] at a time. Callers
//! obtain it with [`BackingCache::load_file_info`] and must call
//! [`CachedFileInfo::release`] exactly once per successful load. The caller
//! whose release drops the count to zero evicts the handle: it is removed from
//! the cache and its resource is closed. A later load allocates a new
//! generation.
//!
//! # Handle States
//!
//! | `ref_count` | In map | Resource |
//! |-------------|--------|----------|
//! | > 0 | yes | open |
//! | 0 | yes | open, eviction pending (a load may still retain it) |
//! | `DEAD_REF` | no | closed |
//!
//! # Locking
//!
//! - Loads of a live handle take only the map read lock.
//! - Creation and eviction of a ledger hold that ledger's lock stripe, so a new
//!   generation is never opened while the previous one is still closing.
//! - The transition to `DEAD_REF` and the map removal happen under the map
//!   write lock, so no load can retain a handle that is being closed.
//! - The flushing close at eviction, including its fsync, runs while the
//!   ledger's stripe is still held. Slow-path loads and evictions of any other
//!   ledger hashed to the same stripe wait for it; live-handle loads do not.

pub mod backing;
pub mod handle;
pub mod stats;

pub use backing::{BackingCache, FileInfoBackingCache, DEFAULT_LOCK_STRIPES};
pub use handle::{CachedFileInfo, DEAD_REF};
pub use stats::CacheStats;

use crate::error::LedgerResult;
use crate::LedgerId;
use std::path::{Path, PathBuf};

/// Resolves a ledger to the location of its backing resource
pub trait LedgerLoader: Send + Sync {
    /// Fails with `NoLedger` iff the resource is missing and
    /// `create_if_not_found` is false
    fn resolve(&self, ledger_id: LedgerId, create_if_not_found: bool) -> LedgerResult<PathBuf>;
}

impl<F> LedgerLoader for F
where
    F: Fn(LedgerId, bool) -> LedgerResult<PathBuf> + Send + Sync,
{
    fn resolve(&self, ledger_id: LedgerId, create_if_not_found: bool) -> LedgerResult<PathBuf> {
        self(ledger_id, create_if_not_found)
    }
}

/// A resource owned by one cache generation
pub trait BackingResource: Send + Sync + 'static {
    /// Release the resource, flushing pending state first if `flush` is set
    fn close(&self, flush: bool) -> LedgerResult<()>;
}

/// Opens the resource at a location returned by a [`LedgerLoader`]
pub trait ResourceOpener<R>: Send + Sync {
    fn open(
        &self,
        ledger_id: LedgerId,
        location: &Path,
        master_key: Option<&[u8]>,
        header_version: u32,
    ) -> LedgerResult<R>;
}

impl<R, F> ResourceOpener<R> for F
where
    F: Fn(LedgerId, &Path, Option<&[u8]>, u32) -> LedgerResult<R> + Send + Sync,
{
    fn open(
        &self,
        ledger_id: LedgerId,
        location: &Path,
        master_key: Option<&[u8]>,
        header_version: u32,
    ) -> LedgerResult<R> {
        self(ledger_id, location, master_key, header_version)
    }
}
