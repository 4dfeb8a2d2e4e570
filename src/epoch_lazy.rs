//! [EpochLazy] computes a value on first use and again whenever the [DisplaySettings] epoch moves on.
//!
//! Reads take a shared lock and compare epochs.  A stale or missing value is recomputed while holding a per-instance
//! mutex, re-checking after the mutex is acquired, so under contention the value is computed at most once per epoch
//! and everyone else waits for that result.
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{DisplaySettings, Snapshot};

struct Stamped<T> {
    epoch: u64,
    value: T,
}

pub struct EpochLazy<T> {
    settings: Arc<DisplaySettings>,
    slot: RwLock<Option<Stamped<T>>>,
    /// Held for the duration of a computation.
    compute_lock: Mutex<()>,
}

impl<T> EpochLazy<T> {
    pub fn new(settings: Arc<DisplaySettings>) -> EpochLazy<T> {
        EpochLazy {
            settings,
            slot: RwLock::new(None),
            compute_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Arc<DisplaySettings> {
        &self.settings
    }

    fn probe_fresh<R>(&self, epoch: u64, probe: &impl Fn(&T) -> Option<R>) -> Option<R> {
        let guard = self.slot.read();
        match &*guard {
            Some(s) if s.epoch == epoch => probe(&s.value),
            _ => None,
        }
    }

    /// Return `probe` of the stored value if it was computed in the current epoch and `probe` accepts it, otherwise
    /// run `compute` and store the first half of its result.
    ///
    /// `compute` receives the snapshot whose epoch the new value is stamped with; a flag change that lands while it
    /// runs only affects the next call.
    pub fn get_or_refresh<R>(
        &self,
        probe: impl Fn(&T) -> Option<R>,
        compute: impl FnOnce(Snapshot) -> (T, R),
    ) -> R {
        if let Some(r) = self.probe_fresh(self.settings.epoch(), &probe) {
            return r;
        }

        let _guard = self.compute_lock.lock();
        let snapshot = self.settings.snapshot();
        if let Some(r) = self.probe_fresh(snapshot.epoch, &probe) {
            return r;
        }

        let (value, ret) = compute(snapshot);
        *self.slot.write() = Some(Stamped {
            epoch: snapshot.epoch,
            value,
        });
        ret
    }

    /// Look at the stored value if it belongs to the current epoch, without computing anything.
    pub fn peek_fresh<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let epoch = self.settings.epoch();
        let guard = self.slot.read();
        match &*guard {
            Some(s) if s.epoch == epoch => Some(f(&s.value)),
            _ => None,
        }
    }

    /// Forget the stored value; the next read recomputes.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    /// Whether some thread is computing right now.
    pub fn is_computing(&self) -> bool {
        self.compute_lock.is_locked()
    }
}

impl<T: Clone> EpochLazy<T> {
    /// Get the memoized value, computing it if this is the first call of the epoch.
    pub fn get(&self, compute: impl FnOnce(Snapshot) -> T) -> T {
        self.get_or_refresh(
            |v| Some(v.clone()),
            |snapshot| {
                let v = compute(snapshot);
                (v.clone(), v)
            },
        )
    }
}
