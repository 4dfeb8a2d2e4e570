//! [AssetHandle] is what callers hold on to: a cheap, clonable reference to something paintable.
//!
//! A handle is one of:
//!
//! - A cached entry from an [crate::IconCache], which decodes on first use and again after the display settings change
//!   or after its pixels were reclaimed.
//! - A fixed asset already in memory.
//! - A deferred handle, which runs a caller-supplied function on first use (and again after the settings change) to
//!   find the handle it stands for.
//!
//! Every query on a handle succeeds: failures are reported as the zero-size empty asset, except through
//! [AssetHandle::try_asset] on a strict cache.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::pipeline::{AssetLoader, Resolution, Retained};
use crate::*;

/// Where a handle is in its decode cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandleState {
    /// Nothing usable is stored for the current epoch, either because nothing was decoded yet, the display settings
    /// changed since, or the pixels were reclaimed.
    Unresolved,
    /// A thread is decoding right now.
    Resolving,
    Resolved,
    /// Every candidate failed in the current epoch; the handle serves the empty asset until the settings change.
    FailedEmpty,
}

/// The per-locator entry behind a cached handle.
pub(crate) struct CachedAsset {
    id: u64,
    locator: Locator,
    loader: Arc<dyn AssetLoader>,
    lazy: EpochLazy<Resolution>,
    /// Number of times candidate resolution ran.
    resolutions: AtomicU64,
}

impl CachedAsset {
    pub(crate) fn new(
        id: u64,
        locator: Locator,
        loader: Arc<dyn AssetLoader>,
        settings: Arc<DisplaySettings>,
    ) -> CachedAsset {
        CachedAsset {
            id,
            locator,
            loader,
            lazy: EpochLazy::new(settings),
            resolutions: AtomicU64::new(0),
        }
    }

    fn fetch(&self) -> Result<Arc<DecodedAsset>, IconError> {
        if !self.lazy.settings().loader_enabled() {
            return Ok(DecodedAsset::empty());
        }

        self.lazy.get_or_refresh(
            |res| {
                let found = res.upgrade();
                if let (Some(Ok(_)), Retained::Soft(_)) = (&found, &res.retained) {
                    self.loader.touch(self.id);
                }
                found
            },
            |snapshot| {
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                self.loader.load(self.id, &self.locator, snapshot)
            },
        )
    }

    fn state(&self) -> HandleState {
        if self.lazy.is_computing() {
            return HandleState::Resolving;
        }

        self.lazy
            .peek_fresh(|res| match &res.retained {
                Retained::Failed(_) => HandleState::FailedEmpty,
                Retained::Soft(w) if w.strong_count() == 0 => HandleState::Unresolved,
                _ => HandleState::Resolved,
            })
            .unwrap_or(HandleState::Unresolved)
    }
}

pub(crate) struct DeferredAsset {
    lazy: EpochLazy<AssetHandle>,
    compute: Box<dyn Fn() -> AssetHandle + Send + Sync>,
}

impl DeferredAsset {
    fn current(&self) -> AssetHandle {
        self.lazy.get(|_| (self.compute)())
    }
}

#[derive(Clone)]
enum HandleInner {
    Cached(Arc<CachedAsset>),
    Fixed(Arc<DecodedAsset>),
    Deferred(Arc<DeferredAsset>),
}

#[derive(Clone)]
pub struct AssetHandle {
    inner: HandleInner,
}

impl AssetHandle {
    pub(crate) fn cached(entry: Arc<CachedAsset>) -> AssetHandle {
        AssetHandle {
            inner: HandleInner::Cached(entry),
        }
    }

    /// Wrap an asset which is already in memory.
    pub fn fixed(asset: Arc<DecodedAsset>) -> AssetHandle {
        AssetHandle {
            inner: HandleInner::Fixed(asset),
        }
    }

    /// A handle to the empty asset.
    pub fn empty() -> AssetHandle {
        AssetHandle::fixed(DecodedAsset::empty())
    }

    /// A handle whose target is computed by `compute` on first use, and again whenever `settings` changes.
    pub fn deferred(
        settings: Arc<DisplaySettings>,
        compute: impl Fn() -> AssetHandle + Send + Sync + 'static,
    ) -> AssetHandle {
        AssetHandle {
            inner: HandleInner::Deferred(Arc::new(DeferredAsset {
                lazy: EpochLazy::new(settings),
                compute: Box::new(compute),
            })),
        }
    }

    /// Get the asset to paint, decoding if necessary.  Never fails; anything missing is the empty asset.
    pub fn asset(&self) -> Arc<DecodedAsset> {
        match &self.inner {
            HandleInner::Cached(entry) => entry.fetch().unwrap_or_else(|_| DecodedAsset::empty()),
            HandleInner::Fixed(asset) => asset.clone(),
            HandleInner::Deferred(deferred) => deferred.current().asset(),
        }
    }

    /// Like [AssetHandle::asset], but a strict cache reports why nothing could be resolved.
    pub fn try_asset(&self) -> Result<Arc<DecodedAsset>, IconError> {
        match &self.inner {
            HandleInner::Cached(entry) => match entry.fetch() {
                Err(e) if entry.loader.is_strict() => Err(e),
                Err(_) => Ok(DecodedAsset::empty()),
                Ok(asset) => Ok(asset),
            },
            HandleInner::Fixed(asset) => Ok(asset.clone()),
            HandleInner::Deferred(deferred) => deferred.current().try_asset(),
        }
    }

    /// Force resolution now rather than on first paint.
    pub fn load(&self) {
        self.asset();
    }

    pub fn width(&self) -> u32 {
        self.asset().width()
    }

    pub fn height(&self) -> u32 {
        self.asset().height()
    }

    pub fn is_empty(&self) -> bool {
        self.asset().is_degenerate()
    }

    /// Whether both handles are backed by the same cache entry, asset, or deferred computation.
    pub fn same_entry(&self, other: &AssetHandle) -> bool {
        match (&self.inner, &other.inner) {
            (HandleInner::Cached(a), HandleInner::Cached(b)) => Arc::ptr_eq(a, b),
            (HandleInner::Fixed(a), HandleInner::Fixed(b)) => Arc::ptr_eq(a, b),
            (HandleInner::Deferred(a), HandleInner::Deferred(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The locator this handle was resolved from, if it came from a cache.
    pub fn locator(&self) -> Option<&Locator> {
        match &self.inner {
            HandleInner::Cached(entry) => Some(&entry.locator),
            _ => None,
        }
    }

    /// The variant that was actually decoded in the current epoch, such as `icons/print@2x_dark.png`.
    pub fn resolved_from(&self) -> Option<Candidate> {
        match &self.inner {
            HandleInner::Cached(entry) => entry.lazy.peek_fresh(|r| r.origin.clone()).flatten(),
            HandleInner::Fixed(_) => None,
            HandleInner::Deferred(deferred) => deferred
                .lazy
                .peek_fresh(|h| h.resolved_from())
                .flatten(),
        }
    }

    pub fn state(&self) -> HandleState {
        match &self.inner {
            HandleInner::Cached(entry) => entry.state(),
            HandleInner::Fixed(_) => HandleState::Resolved,
            HandleInner::Deferred(deferred) => {
                if deferred.lazy.is_computing() {
                    return HandleState::Resolving;
                }
                deferred
                    .lazy
                    .peek_fresh(|h| h.state())
                    .unwrap_or(HandleState::Unresolved)
            }
        }
    }

    /// How many times this handle has run candidate resolution.  Only cached handles resolve candidates.
    pub fn resolution_count(&self) -> u64 {
        match &self.inner {
            HandleInner::Cached(entry) => entry.resolutions.load(Ordering::Relaxed),
            _ => 0,
        }
    }
}

impl From<Arc<DecodedAsset>> for AssetHandle {
    fn from(asset: Arc<DecodedAsset>) -> AssetHandle {
        AssetHandle::fixed(asset)
    }
}

impl From<DecodedAsset> for AssetHandle {
    fn from(asset: DecodedAsset) -> AssetHandle {
        AssetHandle::fixed(Arc::new(asset))
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            HandleInner::Cached(entry) => f
                .debug_struct("AssetHandle")
                .field("locator", &entry.locator)
                .field("state", &entry.state())
                .finish(),
            HandleInner::Fixed(asset) => f
                .debug_struct("AssetHandle")
                .field("width", &asset.width())
                .field("height", &asset.height())
                .finish(),
            HandleInner::Deferred(_) => f.write_str("AssetHandle(deferred)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn square(edge: u32) -> AssetHandle {
        DecodedAsset::new(PixelBuffer::transparent(edge, edge), 1).into()
    }

    #[test]
    fn test_fixed_handles() {
        let a = square(8);
        let b = a.clone();
        assert!(a.same_entry(&b));
        assert!(!a.same_entry(&square(8)));
        assert_eq!((a.width(), a.height()), (8, 8));
        assert_eq!(a.state(), HandleState::Resolved);
        assert!(a.locator().is_none());

        assert!(AssetHandle::empty().is_empty());
        assert!(AssetHandle::empty().try_asset().is_ok());
    }

    #[test]
    fn test_deferred_computes_on_first_use_and_on_theme_change() {
        let settings = Arc::new(DisplaySettings::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = {
            let calls = calls.clone();
            let settings_inner = settings.clone();
            AssetHandle::deferred(settings.clone(), move || {
                calls.fetch_add(1, Ordering::SeqCst);
                if settings_inner.is_dark() {
                    square(4)
                } else {
                    square(6)
                }
            })
        };

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handle.state(), HandleState::Unresolved);

        handle.load();
        assert_eq!(handle.width(), 6);
        assert_eq!(handle.height(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), HandleState::Resolved);

        settings.set_dark(true);
        assert_eq!(handle.state(), HandleState::Unresolved);
        assert_eq!(handle.width(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
