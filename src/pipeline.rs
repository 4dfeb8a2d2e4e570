//! Turning a locator into a retained asset: walk the variant candidates in order, decode the first one that works,
//! then decide how strongly to hold on to the result.
use std::io::{ErrorKind, Read};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::*;

/// How an entry holds its payload between accesses.
pub(crate) enum Retained {
    /// Small assets are kept for the lifetime of the entry.
    Strong(Arc<DecodedAsset>),
    /// Large assets live in the reclaimable pool, and may vanish.
    Soft(Weak<DecodedAsset>),
    /// Decoded, but to nothing; the entry serves the empty asset.
    Degenerate,
    /// No candidate worked in this epoch.
    Failed(IconError),
}

/// The outcome of one resolution attempt, as stored by an entry.
pub(crate) struct Resolution {
    pub(crate) retained: Retained,
    /// Which candidate won, for diagnostics.
    pub(crate) origin: Option<Candidate>,
}

impl Resolution {
    /// Get the payload back, or `None` if it was reclaimed and must be decoded again.
    pub(crate) fn upgrade(&self) -> Option<Result<Arc<DecodedAsset>, IconError>> {
        match &self.retained {
            Retained::Strong(a) => Some(Ok(a.clone())),
            Retained::Soft(w) => w.upgrade().map(Ok),
            Retained::Degenerate => Some(Ok(DecodedAsset::empty())),
            Retained::Failed(e) => Some(Err(e.clone())),
        }
    }
}

/// The object-safe face of a [Pipeline], so that entries don't need to carry the lookup and decoder types.
pub(crate) trait AssetLoader: Send + Sync {
    fn load(
        &self,
        id: u64,
        locator: &Locator,
        snapshot: Snapshot,
    ) -> (Resolution, Result<Arc<DecodedAsset>, IconError>);

    /// Mark a pooled asset as recently used, so busy large images are evicted last.
    fn touch(&self, id: u64);

    fn is_strict(&self) -> bool;
}

pub(crate) struct Pipeline<L, D> {
    lookup: L,
    decoder: D,
    strict: bool,
    small_asset_edge: u32,
    /// Keyed by entry id.
    pool: Mutex<ReclaimablePool<u64, DecodedAsset>>,
}

impl<L: ResourceLookup, D: Decoder> Pipeline<L, D> {
    pub(crate) fn new(lookup: L, decoder: D, config: &IconCacheConfig) -> Pipeline<L, D> {
        Pipeline {
            lookup,
            decoder,
            strict: config.strict,
            small_asset_edge: config.small_asset_edge,
            pool: Mutex::new(ReclaimablePool::new(config.max_reclaimable_cost)),
        }
    }

    /// Read one candidate fully into memory, close it, and decode it.
    fn decode_candidate(&self, candidate: &Candidate) -> Result<DecodedAsset, IconError> {
        let mut reader = self.lookup.open(&candidate.locator).map_err(|e| {
            if e.kind() != ErrorKind::NotFound {
                tracing::debug!(locator = %candidate.locator, error = %e, "Lookup failed");
            }
            IconError::NotFound {
                locator: candidate.locator.clone(),
            }
        })?;

        let mut bytes = vec![];
        let read = reader.read_to_end(&mut bytes);
        std::mem::drop(reader);
        read.map_err(|e| IconError::DecodeFailed {
            locator: candidate.locator.clone(),
            reason: e.to_string(),
        })?;

        let buffer = self
            .decoder
            .decode(&bytes[..])
            .map_err(|e| IconError::DecodeFailed {
                locator: candidate.locator.clone(),
                reason: e.to_string(),
            })?;
        Ok(DecodedAsset::new(buffer, candidate.scale))
    }

    /// Try every candidate in priority order, stopping at the first that decodes.
    fn decode_first(
        &self,
        locator: &Locator,
        snapshot: Snapshot,
    ) -> Result<(Candidate, DecodedAsset), IconError> {
        let mut decode_failure = None;
        for candidate in candidates(locator, snapshot.dark, snapshot.high_density) {
            match self.decode_candidate(&candidate) {
                Ok(asset) => return Ok((candidate, asset)),
                Err(e) => {
                    tracing::trace!(error = %e, "Skipping candidate");
                    if let IconError::DecodeFailed { .. } = e {
                        decode_failure = Some(e);
                    }
                }
            }
        }

        Err(decode_failure.unwrap_or_else(|| IconError::NotFound {
            locator: locator.clone(),
        }))
    }

    /// Small assets are held strongly; everything else goes through the pool so it can be reclaimed.
    fn retain(&self, id: u64, asset: DecodedAsset) -> (Retained, Arc<DecodedAsset>) {
        let small = asset.width() < self.small_asset_edge && asset.height() < self.small_asset_edge;
        let cost = asset.estimate_cost();
        let asset = Arc::new(asset);
        if small {
            // Whatever this entry resolved to before is stale now.
            self.forget(id);
            return (Retained::Strong(asset.clone()), asset);
        }

        let mut pool = self.pool.lock();
        if cost <= pool.max_cost() {
            pool.insert(id, asset.clone(), cost);
        } else {
            // Bigger than the whole budget: only the caller keeps this alive.
            tracing::debug!(cost, max_cost = pool.max_cost(), "Asset too large to pool");
            pool.remove(&id);
        }
        (Retained::Soft(Arc::downgrade(&asset)), asset)
    }

    fn forget(&self, id: u64) {
        self.pool.lock().remove(&id);
    }

    /// Decode a locator for explicit display flags, bypassing entries and the pool.
    ///
    /// Failures follow the strictness of the cache: an error when strict, the empty asset otherwise.
    pub(crate) fn load_detached(
        &self,
        locator: &Locator,
        snapshot: Snapshot,
    ) -> Result<Arc<DecodedAsset>, IconError> {
        match self.decode_first(locator, snapshot) {
            Ok((candidate, asset)) => Ok(asset
                .check_size(&candidate.locator)
                .map(Arc::new)
                .unwrap_or_else(|_| DecodedAsset::empty())),
            Err(e) if self.strict => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Icon could not be loaded");
                Ok(DecodedAsset::empty())
            }
        }
    }

    /// Drop every pooled asset; returns how many were released.
    pub(crate) fn release_reclaimable(&self) -> usize {
        self.pool.lock().clear()
    }

    pub(crate) fn pooled_cost(&self) -> u64 {
        self.pool.lock().current_cost()
    }
}

impl<L: ResourceLookup, D: Decoder> AssetLoader for Pipeline<L, D> {
    fn load(
        &self,
        id: u64,
        locator: &Locator,
        snapshot: Snapshot,
    ) -> (Resolution, Result<Arc<DecodedAsset>, IconError>) {
        let (candidate, asset) = match self.decode_first(locator, snapshot) {
            Ok(x) => x,
            Err(e) => {
                if self.strict {
                    tracing::warn!(error = %e, "Icon could not be resolved");
                } else {
                    tracing::debug!(error = %e, "Icon could not be resolved");
                }
                self.forget(id);
                let resolution = Resolution {
                    retained: Retained::Failed(e.clone()),
                    origin: None,
                };
                return (resolution, Err(e));
            }
        };

        match asset.check_size(&candidate.locator) {
            Ok(asset) => {
                tracing::debug!(
                    %locator,
                    from = %candidate.locator,
                    width = asset.width(),
                    height = asset.height(),
                    epoch = snapshot.epoch,
                    "Resolved icon"
                );
                let (retained, asset) = self.retain(id, asset);
                let resolution = Resolution {
                    retained,
                    origin: Some(candidate),
                };
                (resolution, Ok(asset))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Using the empty asset");
                self.forget(id);
                let resolution = Resolution {
                    retained: Retained::Degenerate,
                    origin: Some(candidate),
                };
                (resolution, Ok(DecodedAsset::empty()))
            }
        }
    }

    fn touch(&self, id: u64) {
        self.pool.lock().get(&id);
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}
