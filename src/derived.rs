//! Disabled and transparent variants, computed from a resolved asset and cached against that asset's identity.
//!
//! Identity is the address of the source `Arc<DecodedAsset>`: two assets with equal pixels never share an entry.
//! Entries hold the source weakly, so once the source is dropped everywhere else its entry is dead and gets swept the
//! next time the map grows.  The derived value itself is an [EpochLazy], which rerenders after a display settings
//! change since both the gray level and the output density depend on them.
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::*;

type DerivedHashMap<V> = HashMap<DerivedKey, V, ahash::RandomState>;

/// Which derivation to apply.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Disabled,
    /// Alpha multiplied by the contained `f32`, stored as its bits so the kind can be hashed.
    Transparent(u32),
}

impl VariantKind {
    pub fn transparent(alpha: f32) -> VariantKind {
        VariantKind::Transparent(alpha.to_bits())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct DerivedKey {
    source: usize,
    kind: VariantKind,
}

struct DerivedEntry {
    source: Weak<DecodedAsset>,
    value: EpochLazy<Arc<DecodedAsset>>,
}

struct Entries {
    map: DerivedHashMap<Arc<DerivedEntry>>,
    /// Sweep dead entries once the map reaches this size.
    sweep_at: usize,
}

const MIN_SWEEP: usize = 64;

pub struct DerivedCache<F> {
    settings: Arc<DisplaySettings>,
    filter: F,
    entries: Mutex<Entries>,
}

impl<F: Filter> DerivedCache<F> {
    pub fn new(settings: Arc<DisplaySettings>, filter: F) -> DerivedCache<F> {
        DerivedCache {
            settings,
            filter,
            entries: Mutex::new(Entries {
                map: Default::default(),
                sweep_at: MIN_SWEEP,
            }),
        }
    }

    /// Get the `kind` variant of `source`, rendering it if it isn't cached for the current epoch.
    ///
    /// A degenerate source yields the empty asset without touching the filter.
    pub fn derive(&self, source: &Arc<DecodedAsset>, kind: VariantKind) -> Arc<DecodedAsset> {
        if source.is_degenerate() {
            return DecodedAsset::empty();
        }

        let entry = self.entry_for(source, kind);
        entry
            .value
            .get(|snapshot| Arc::new(self.render(source, kind, snapshot)))
    }

    /// Find the live entry for this source, or insert a fresh one.
    fn entry_for(&self, source: &Arc<DecodedAsset>, kind: VariantKind) -> Arc<DerivedEntry> {
        let key = DerivedKey {
            source: Arc::as_ptr(source) as usize,
            kind,
        };

        let mut entries = self.entries.lock();
        if let Some(e) = entries.map.get(&key) {
            // While any `Weak` to an allocation exists, its address can't be reused, so a live weak at this address
            // is our source.
            if e.source.strong_count() > 0 {
                return e.clone();
            }
        }

        let entry = Arc::new(DerivedEntry {
            source: Arc::downgrade(source),
            value: EpochLazy::new(self.settings.clone()),
        });
        entries.map.insert(key, entry.clone());

        if entries.map.len() >= entries.sweep_at {
            let before = entries.map.len();
            entries.map.retain(|_, e| e.source.strong_count() > 0);
            entries.sweep_at = (entries.map.len() * 2).max(MIN_SWEEP);
            tracing::debug!(
                removed = before - entries.map.len(),
                remaining = entries.map.len(),
                "Swept derived icons"
            );
        }

        entry
    }

    /// Draw the source at the current density and apply the derivation.
    fn render(&self, source: &DecodedAsset, kind: VariantKind, snapshot: Snapshot) -> DecodedAsset {
        let scale = snapshot.scale_factor();
        let canvas = source
            .buffer()
            .resample(source.width() * scale, source.height() * scale);

        let pixels = match kind {
            VariantKind::Disabled => {
                let intensity = if snapshot.dark {
                    DARK_DISABLED_INTENSITY
                } else {
                    LIGHT_DISABLED_INTENSITY
                };
                self.filter.desaturate(&canvas, intensity)
            }
            VariantKind::Transparent(bits) => apply_alpha(&canvas, f32::from_bits(bits)),
        };
        tracing::trace!(?kind, epoch = snapshot.epoch, "Rendered derived icon");
        DecodedAsset::new(pixels, scale)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.map.clear();
        entries.sweep_at = MIN_SWEEP;
    }

    /// Drop entries whose source is gone, returning how many remain.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.map.retain(|_, e| e.source.strong_count() > 0);
        entries.map.len()
    }

    /// Number of entries, including dead ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
