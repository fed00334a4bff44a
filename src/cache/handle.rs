//! Cache entry wrapping one generation of a ledger's resource

use super::backing::Shared;
use super::BackingResource;
use crate::error::{LedgerError, LedgerResult};
use crate::LedgerId;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Weak;
use tracing::error;

/// Reference count of a retired handle
pub const DEAD_REF: i32 = i32::MIN;

/// One live generation of a ledger's backing resource
///
/// Obtained from [`BackingCache::load_file_info`](super::BackingCache::load_file_info).
/// Dereferences to the resource.
pub struct CachedFileInfo<R: BackingResource> {
    ledger_id: LedgerId,
    generation: u64,
    resource: R,
    ref_count: AtomicI32,
    closed: AtomicBool,
    cache: Weak<Shared<R>>,
}

impl<R: BackingResource> CachedFileInfo<R> {
    pub(super) fn new(
        ledger_id: LedgerId,
        generation: u64,
        resource: R,
        cache: Weak<Shared<R>>,
    ) -> Self {
        Self {
            ledger_id,
            generation,
            resource,
            ref_count: AtomicI32::new(1),
            closed: AtomicBool::new(false),
            cache,
        }
    }

    pub fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    /// Identifies this handle instance among all handles of its cache
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current reference count, or [`DEAD_REF`] once retired
    pub fn ref_count(&self) -> i32 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// True once the resource has been released
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Drop one reference taken by a load
    ///
    /// The caller that drops the count to zero evicts the handle. Eviction
    /// failures are logged, never returned. Releasing a handle that holds no
    /// references fails with `AlreadyRetired`.
    pub fn release(&self) -> LedgerResult<()> {
        let mut current = self.ref_count.load(Ordering::Acquire);
        loop {
            if current <= 0 {
                return Err(LedgerError::AlreadyRetired {
                    ledger_id: self.ledger_id,
                    generation: self.generation,
                });
            }
            match self.ref_count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if current == 1 {
            match self.cache.upgrade() {
                Some(cache) => cache.evict(self),
                None => self.retire_orphan(),
            }
        }
        Ok(())
    }

    /// Take a reference unless the handle is retired
    ///
    /// A zero count is accepted: its evictor has not retired it yet and will
    /// back off when it sees the new reference.
    pub(super) fn try_retain(&self) -> bool {
        let mut current = self.ref_count.load(Ordering::Acquire);
        loop {
            if current < 0 {
                return false;
            }
            let Some(next) = current.checked_add(1) else {
                return false;
            };
            match self.ref_count.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Retire an unreferenced handle; only the winner may close the resource
    pub(super) fn mark_dead(&self) -> bool {
        self.ref_count
            .compare_exchange(0, DEAD_REF, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Retire regardless of outstanding references
    ///
    /// Returns false if the handle was already retired.
    pub(super) fn force_dead(&self) -> bool {
        self.ref_count.swap(DEAD_REF, Ordering::AcqRel) != DEAD_REF
    }

    pub(super) fn close_resource(&self, flush: bool) -> LedgerResult<()> {
        let result = self.resource.close(flush);
        self.closed.store(true, Ordering::Release);
        result
    }

    pub(super) fn log_eviction_failure(&self, err: &LedgerError) {
        error!(
            ledger_id = self.ledger_id,
            generation = self.generation,
            error = %err,
            "Error evicting file info from backing cache"
        );
    }

    fn retire_orphan(&self) {
        if self.mark_dead() {
            if let Err(e) = self.close_resource(true) {
                self.log_eviction_failure(&e);
            }
        }
    }
}

impl<R: BackingResource> Deref for CachedFileInfo<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R: BackingResource> fmt::Debug for CachedFileInfo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFileInfo")
            .field("ledger_id", &self.ledger_id)
            .field("generation", &self.generation)
            .field("ref_count", &self.ref_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<R: BackingResource> fmt::Display for CachedFileInfo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file info {}#{}", self.ledger_id, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingResource {
        closes: AtomicUsize,
    }

    impl BackingResource for CountingResource {
        fn close(&self, _flush: bool) -> LedgerResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn orphan() -> CachedFileInfo<CountingResource> {
        CachedFileInfo::new(4, 0, CountingResource::default(), Weak::new())
    }

    #[test]
    fn retain_and_release_count() {
        let fi = orphan();
        assert!(fi.try_retain());
        assert_eq!(fi.ref_count(), 2);

        fi.release().unwrap();
        assert_eq!(fi.ref_count(), 1);
        assert!(!fi.is_closed());
    }

    #[test]
    fn orphan_closes_itself_on_last_release() {
        let fi = orphan();
        fi.release().unwrap();

        assert_eq!(fi.ref_count(), DEAD_REF);
        assert!(fi.is_closed());
        assert_eq!(fi.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retired_handle_cannot_be_retained() {
        let fi = orphan();
        fi.release().unwrap();
        assert!(!fi.try_retain());
        assert_eq!(fi.ref_count(), DEAD_REF);
    }

    #[test]
    fn retain_refuses_to_overflow() {
        let fi = orphan();
        fi.ref_count.store(i32::MAX, Ordering::SeqCst);

        assert!(!fi.try_retain());
        assert_eq!(fi.ref_count(), i32::MAX);
    }

    #[test]
    fn double_release_is_already_retired() {
        let fi = orphan();
        fi.release().unwrap();

        let err = fi.release().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AlreadyRetired {
                ledger_id: 4,
                generation: 0
            }
        ));
        assert_eq!(fi.ref_count(), DEAD_REF);
        assert_eq!(fi.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mark_dead_requires_zero() {
        let fi = orphan();
        assert!(!fi.mark_dead());
        assert!(fi.force_dead());
        assert!(!fi.force_dead());
    }

    #[test]
    fn deref_reaches_resource() {
        let fi = Arc::new(orphan());
        fi.close(false).unwrap();
        assert_eq!(fi.resource().closes.load(Ordering::SeqCst), 1);
        assert!(!fi.is_closed());
    }

    #[test]
    fn display_names_ledger_and_generation() {
        assert_eq!(orphan().to_string(), "file info 4#0");
    }
}
