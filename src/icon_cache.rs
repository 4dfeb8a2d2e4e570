//! The [IconCache] drives a [ResourceLookup] and a [Decoder], handing out lazily decoded [AssetHandle]s keyed by
//! [Locator].
//!
//! Resolving a locator never decodes anything; it only finds or creates the entry.  The first time the handle is
//! asked for its size or pixels, the entry walks the variant candidates for the current display settings (dark
//! and/or high density first, the base file last) and keeps the first one that decodes.
//!
//! Entries live as long as the cache, but their payloads don't have to:
//!
//! - Changing the theme or density moves the settings to a new epoch, and each entry re-resolves on next use.
//! - Small icons are held strongly.  Larger images are held in a cost-bounded pool and only weakly by their entry,
//!   so they are freed when the pool evicts them or [IconCache::release_reclaimable] is called, and decoded again on
//!   next use.
//!
//! Disabled and transparent variants go through a separate [DerivedCache] keyed by the identity of the resolved asset.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::handle::CachedAsset;
use crate::pipeline::{AssetLoader, Pipeline};
use crate::*;

type CacheHashMap<V> = HashMap<Locator, V, ahash::RandomState>;

/// Icons smaller than this in both logical dimensions are never reclaimed.
pub const DEFAULT_SMALL_ASSET_EDGE: u32 = 50;
/// Default budget of the reclaimable pool, in bytes.
pub const DEFAULT_MAX_RECLAIMABLE_COST: u64 = 64 * 1024 * 1024;
/// Alpha used by [IconCache::transparent_variant_of] when the caller has no preference.
pub const DEFAULT_TRANSPARENT_ALPHA: f32 = 0.5;

#[derive(Debug, derive_builder::Builder)]
pub struct IconCacheConfig {
    /// Report resolution failures as errors from [AssetHandle::try_asset] and [IconCache::load], instead of serving
    /// the empty asset.
    #[builder(default = "false")]
    pub strict: bool,
    /// Assets below this logical width and height are held strongly.
    #[builder(default = "DEFAULT_SMALL_ASSET_EDGE")]
    pub small_asset_edge: u32,
    /// Maximum cost of the reclaimable pool in bytes.
    #[builder(default = "DEFAULT_MAX_RECLAIMABLE_COST")]
    pub max_reclaimable_cost: u64,
    /// The display flags this cache follows.
    #[builder(default = "DisplaySettings::global()")]
    pub settings: Arc<DisplaySettings>,
}

impl Default for IconCacheConfig {
    fn default() -> Self {
        IconCacheConfig {
            strict: false,
            small_asset_edge: DEFAULT_SMALL_ASSET_EDGE,
            max_reclaimable_cost: DEFAULT_MAX_RECLAIMABLE_COST,
            settings: DisplaySettings::global(),
        }
    }
}

pub struct IconCache<LookupImpl: ResourceLookup, DecoderImpl: Decoder, FilterImpl: Filter = GrayFilter> {
    settings: Arc<DisplaySettings>,
    entries: RwLock<CacheHashMap<Arc<CachedAsset>>>,
    pipeline: Arc<Pipeline<LookupImpl, DecoderImpl>>,
    derived: DerivedCache<FilterImpl>,
    next_id: AtomicU64,
}

impl<LookupImpl: ResourceLookup, DecoderImpl: Decoder> IconCache<LookupImpl, DecoderImpl, GrayFilter> {
    pub fn new(
        lookup: LookupImpl,
        decoder: DecoderImpl,
        config: IconCacheConfig,
    ) -> IconCache<LookupImpl, DecoderImpl, GrayFilter> {
        IconCache::with_filter(lookup, decoder, GrayFilter, config)
    }
}

impl<LookupImpl: ResourceLookup, DecoderImpl: Decoder, FilterImpl: Filter>
    IconCache<LookupImpl, DecoderImpl, FilterImpl>
{
    pub fn with_filter(
        lookup: LookupImpl,
        decoder: DecoderImpl,
        filter: FilterImpl,
        config: IconCacheConfig,
    ) -> IconCache<LookupImpl, DecoderImpl, FilterImpl> {
        IconCache {
            pipeline: Arc::new(Pipeline::new(lookup, decoder, &config)),
            derived: DerivedCache::new(config.settings.clone(), filter),
            entries: RwLock::new(Default::default()),
            next_id: AtomicU64::new(0),
            settings: config.settings,
        }
    }

    pub fn settings(&self) -> &Arc<DisplaySettings> {
        &self.settings
    }

    /// Find an entry, returning `None` if this locator was never resolved.
    fn search_for_entry(&self, locator: &Locator) -> Option<Arc<CachedAsset>> {
        self.entries.read().get(locator).cloned()
    }

    /// Get the handle for a locator, creating its entry if needed.  Doesn't decode anything.
    ///
    /// Every call with an equal locator returns a handle to the same entry, including concurrent first calls: all of
    /// them build a candidate entry, the first to insert it wins, and the rest are discarded unused.
    pub fn resolve(&self, locator: impl Into<Locator>) -> AssetHandle {
        let locator = locator.into();
        if let Some(x) = self.search_for_entry(&locator) {
            return AssetHandle::cached(x);
        }

        let loader: Arc<dyn AssetLoader> = self.pipeline.clone();
        let fresh = Arc::new(CachedAsset::new(
            self.next_id.fetch_add(1, Ordering::Relaxed),
            locator.clone(),
            loader,
            self.settings.clone(),
        ));
        let winner = self
            .entries
            .write()
            .entry(locator)
            .or_insert(fresh)
            .clone();
        AssetHandle::cached(winner)
    }

    /// Resolve and decode a locator right away.
    ///
    /// In strict mode a locator none of whose variants can be loaded is an error; otherwise it is the empty asset.
    pub fn load(&self, locator: impl Into<Locator>) -> Result<Arc<DecodedAsset>, IconError> {
        self.resolve(locator).try_asset()
    }

    /// Decode a locator as it would look under the given flags, without consulting or changing the shared settings.
    ///
    /// The result is not cached; resolve the locator instead for anything painted repeatedly.
    pub fn load_with(
        &self,
        locator: impl Into<Locator>,
        dark: bool,
        high_density: bool,
    ) -> Result<Arc<DecodedAsset>, IconError> {
        let snapshot = Snapshot {
            dark,
            high_density,
            epoch: self.settings.epoch(),
        };
        self.pipeline.load_detached(&locator.into(), snapshot)
    }

    /// Get the grayed-out version of whatever `handle` currently shows.
    pub fn disabled_variant_of(&self, handle: &AssetHandle) -> AssetHandle {
        self.derived
            .derive(&handle.asset(), VariantKind::Disabled)
            .into()
    }

    /// Get a copy of whatever `handle` currently shows with its alpha scaled by `alpha`.
    pub fn transparent_variant_of(&self, handle: &AssetHandle, alpha: f32) -> AssetHandle {
        self.derived
            .derive(&handle.asset(), VariantKind::transparent(alpha))
            .into()
    }

    /// A handle computed by `compute` on first use, and again after the display settings change.
    pub fn defer(&self, compute: impl Fn() -> AssetHandle + Send + Sync + 'static) -> AssetHandle {
        AssetHandle::deferred(self.settings.clone(), compute)
    }

    /// Switch between dark and light icons.
    ///
    /// Cached handles notice on their next use.  Derived variants are dropped immediately, since their gray levels
    /// depend on the theme.
    pub fn set_theme(&self, dark: bool) {
        self.settings.set_dark(dark);
        self.derived.clear();
    }

    pub fn set_high_density(&self, high_density: bool) {
        if self.settings.set_high_density(high_density) {
            self.derived.clear();
        }
    }

    /// Disable or re-enable decoding for every handle following this cache's settings.
    pub fn set_loader_enabled(&self, enabled: bool) {
        self.settings.set_loader_enabled(enabled);
    }

    /// Let go of every large asset held only for caching; returns how many were released.
    ///
    /// Call this when the application is under memory pressure.  Affected handles decode again on next use.
    pub fn release_reclaimable(&self) -> usize {
        let released = self.pipeline.release_reclaimable();
        tracing::debug!(released, "Released reclaimable icons");
        released
    }

    /// Bytes currently held by the reclaimable pool.
    pub fn reclaimable_cost(&self) -> u64 {
        self.pipeline.pooled_cost()
    }

    /// Number of locators with an entry.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of derived variants, including any whose source died since the last sweep.
    pub fn derived_len(&self) -> usize {
        self.derived.len()
    }
}
