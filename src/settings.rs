//! Process-wide display flags read by every cache entry.
//!
//! The theme and density flags are packed into one atomic word together with an epoch counter which advances every
//! time either flag actually changes.  Entries remember the epoch they were computed in, so a flag change invalidates
//! all of them at once without walking any map.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

const DARK_BIT: u64 = 1;
const HIGH_DENSITY_BIT: u64 = 2;
const EPOCH_SHIFT: u32 = 2;

/// A consistent view of the flags, taken once per resolution attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub dark: bool,
    pub high_density: bool,
    pub epoch: u64,
}

impl Snapshot {
    fn unpack(word: u64) -> Snapshot {
        Snapshot {
            dark: word & DARK_BIT != 0,
            high_density: word & HIGH_DENSITY_BIT != 0,
            epoch: word >> EPOCH_SHIFT,
        }
    }

    /// Pixels per logical pixel at this density.
    pub fn scale_factor(&self) -> u32 {
        if self.high_density {
            2
        } else {
            1
        }
    }
}

#[derive(Debug)]
pub struct DisplaySettings {
    state: AtomicU64,
    loader_enabled: AtomicBool,
}

static GLOBAL: OnceLock<Arc<DisplaySettings>> = OnceLock::new();

impl DisplaySettings {
    pub fn new(dark: bool, high_density: bool) -> DisplaySettings {
        let mut word = 0;
        if dark {
            word |= DARK_BIT;
        }
        if high_density {
            word |= HIGH_DENSITY_BIT;
        }
        DisplaySettings {
            state: AtomicU64::new(word),
            loader_enabled: AtomicBool::new(true),
        }
    }

    /// The settings shared by every cache that isn't given its own; starts out light and standard density.
    pub fn global() -> Arc<DisplaySettings> {
        GLOBAL
            .get_or_init(|| Arc::new(DisplaySettings::new(false, false)))
            .clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::unpack(self.state.load(Ordering::Acquire))
    }

    pub fn is_dark(&self) -> bool {
        self.snapshot().dark
    }

    pub fn is_high_density(&self) -> bool {
        self.snapshot().high_density
    }

    pub fn epoch(&self) -> u64 {
        self.snapshot().epoch
    }

    /// Set the theme flag, returning whether it changed.
    pub fn set_dark(&self, dark: bool) -> bool {
        self.update_flag(DARK_BIT, dark)
    }

    /// Set the density flag, returning whether it changed.
    pub fn set_high_density(&self, high_density: bool) -> bool {
        self.update_flag(HIGH_DENSITY_BIT, high_density)
    }

    /// Flip one flag bit and advance the epoch in the same atomic step, unless the bit already holds `value`.
    fn update_flag(&self, bit: u64, value: bool) -> bool {
        let res = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                if (word & bit != 0) == value {
                    return None;
                }
                let flags = (word & (DARK_BIT | HIGH_DENSITY_BIT)) ^ bit;
                let epoch = (word >> EPOCH_SHIFT).wrapping_add(1);
                Some((epoch << EPOCH_SHIFT) | flags)
            });

        match res {
            Ok(old) => {
                let new = self.snapshot();
                tracing::debug!(
                    dark = new.dark,
                    high_density = new.high_density,
                    epoch = new.epoch,
                    previous_epoch = old >> EPOCH_SHIFT,
                    "Display settings changed"
                );
                true
            }
            Err(_) => false,
        }
    }

    pub fn loader_enabled(&self) -> bool {
        self.loader_enabled.load(Ordering::Acquire)
    }

    /// When disabled, every cached handle serves the empty asset until the loader is enabled again.
    pub fn set_loader_enabled(&self, enabled: bool) {
        let was = self.loader_enabled.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            tracing::debug!(enabled, "Icon loader toggled");
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings::new(false, false)
    }
}
