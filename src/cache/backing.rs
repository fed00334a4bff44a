//! Ledger id to live handle map with load, evict and shutdown

use super::handle::CachedFileInfo;
use super::stats::{CacheStats, StatsCounters};
use super::{BackingResource, LedgerLoader, ResourceOpener};
use crate::config::schema::StorageConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::fileinfo::{DirectoryLoader, FileInfo, FileInfoOpener};
use crate::LedgerId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of per-ledger lock stripes
pub const DEFAULT_LOCK_STRIPES: usize = 64;

/// Backing cache over [`FileInfo`] index files
pub type FileInfoBackingCache = BackingCache<FileInfo>;

/// State shared between the cache and the handles it hands out
pub(super) struct Shared<R: BackingResource> {
    entries: RwLock<HashMap<LedgerId, Arc<CachedFileInfo<R>>>>,
    stripes: Box<[Mutex<()>]>,
    stats: StatsCounters,
}

impl<R: BackingResource> Shared<R> {
    fn new(stripes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
            stats: StatsCounters::default(),
        }
    }

    fn stripe(&self, ledger_id: LedgerId) -> &Mutex<()> {
        let index = (ledger_id % self.stripes.len() as u64) as usize;
        &self.stripes[index]
    }

    fn try_retain(&self, ledger_id: LedgerId) -> Option<Arc<CachedFileInfo<R>>> {
        let entries = self.entries.read();
        entries
            .get(&ledger_id)
            .filter(|fi| fi.try_retain())
            .cloned()
    }

    /// Retire and close a handle whose count just reached zero
    pub(super) fn evict(&self, fi: &CachedFileInfo<R>) {
        let ledger_id = fi.ledger_id();
        let _stripe = self.stripe(ledger_id).lock();

        {
            let mut entries = self.entries.write();
            if !fi.mark_dead() {
                // Retained again by a concurrent load, or already retired.
                return;
            }
            let is_current = entries
                .get(&ledger_id)
                .is_some_and(|current| ptr::eq(Arc::as_ptr(current), fi));
            if is_current {
                entries.remove(&ledger_id);
            }
        }

        match fi.close_resource(true) {
            Ok(()) => {
                self.stats.inc_eviction();
                debug!("Evicted {} from backing cache", fi);
            }
            Err(e) => {
                self.stats.inc_eviction_failure();
                fi.log_eviction_failure(&e);
            }
        }
    }
}

/// Shares one open resource per ledger among all concurrent holders
pub struct BackingCache<R: BackingResource> {
    shared: Arc<Shared<R>>,
    loader: Box<dyn LedgerLoader>,
    opener: Box<dyn ResourceOpener<R>>,
    header_version: u32,
    next_generation: AtomicU64,
}

impl BackingCache<FileInfo> {
    /// Create a cache of [`FileInfo`] index files
    pub fn new(loader: impl LedgerLoader + 'static, header_version: u32) -> Self {
        Self::with_opener(loader, FileInfoOpener, header_version)
    }

    /// Create a cache over the ledger directory from configuration
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(DirectoryLoader::new(&config.ledger_dir), config.header_version)
            .with_lock_stripes(config.lock_stripes)
    }
}

impl<R: BackingResource> BackingCache<R> {
    /// Create a cache with a custom resource opener
    pub fn with_opener(
        loader: impl LedgerLoader + 'static,
        opener: impl ResourceOpener<R> + 'static,
        header_version: u32,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(DEFAULT_LOCK_STRIPES)),
            loader: Box::new(loader),
            opener: Box::new(opener),
            header_version,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Set the number of per-ledger lock stripes (at least one)
    pub fn with_lock_stripes(mut self, stripes: usize) -> Self {
        self.shared = Arc::new(Shared::new(stripes));
        self
    }

    /// Header version passed to newly opened resources
    pub fn header_version(&self) -> u32 {
        self.header_version
    }

    /// Get the live handle for a ledger, opening its resource if needed
    ///
    /// With a master key the resource is created when missing; without one,
    /// a missing resource fails with `NoLedger`. Every successful load must
    /// be paired with one [`CachedFileInfo::release`].
    pub fn load_file_info(
        &self,
        ledger_id: LedgerId,
        master_key: Option<&[u8]>,
    ) -> LedgerResult<Arc<CachedFileInfo<R>>> {
        if let Some(fi) = self.shared.try_retain(ledger_id) {
            self.shared.stats.inc_hit();
            return Ok(fi);
        }

        let _stripe = self.shared.stripe(ledger_id).lock();

        // Another loader may have installed a generation while we waited.
        if let Some(fi) = self.shared.try_retain(ledger_id) {
            self.shared.stats.inc_hit();
            return Ok(fi);
        }

        let location = self.loader.resolve(ledger_id, master_key.is_some())?;
        let resource = self
            .opener
            .open(ledger_id, &location, master_key, self.header_version)?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let fi = Arc::new(CachedFileInfo::new(
            ledger_id,
            generation,
            resource,
            Arc::downgrade(&self.shared),
        ));

        self.shared
            .entries
            .write()
            .insert(ledger_id, Arc::clone(&fi));
        self.shared.stats.inc_creation();

        debug!("Loaded {} from {}", fi, location.display());
        Ok(fi)
    }

    /// Close every cached resource without flushing and empty the cache
    ///
    /// Outstanding references are ignored. All handles are closed even if
    /// some fail; the first failure is returned.
    pub fn close_all_without_flushing(&self) -> LedgerResult<()> {
        let _stripes: Vec<_> = self.shared.stripes.iter().map(|s| s.lock()).collect();

        let drained: Vec<_> = self
            .shared
            .entries
            .write()
            .drain()
            .map(|(_, fi)| fi)
            .collect();

        let mut closed = 0usize;
        let mut first_error = None;

        for fi in drained {
            if !fi.force_dead() {
                continue;
            }
            match fi.close_resource(false) {
                Ok(()) => closed += 1,
                Err(e) => {
                    warn!("Failed to close {} during shutdown: {}", fi, e);
                    if first_error.is_none() {
                        first_error = Some(LedgerError::ShutdownClose {
                            ledger_id: fi.ledger_id(),
                            source: Box::new(e),
                        });
                    }
                }
            }
        }

        info!("Closed {} file infos without flushing", closed);
        first_error.map_or(Ok(()), Err)
    }

    /// Number of ledgers with a live handle
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a ledger currently has a handle in the cache
    pub fn contains(&self, ledger_id: LedgerId) -> bool {
        self.shared.entries.read().contains_key(&ledger_id)
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.len())
    }
}
