//! A process-wide cache of decoded icons which follows the application's theme and display density.
//!
//! Applications ship icons as files like `icons/print.png`, optionally next to `print_dark.png`, `print@2x.png` and
//! `print@2x_dark.png`.  This crate turns the base locator into something paintable, picking the right variant for the
//! current [DisplaySettings], and doing so as lazily and as rarely as possible:
//!
//! [IconCache::resolve] returns an [AssetHandle] without touching the disk.  The first time the handle's size or pixels
//! are needed, the candidates from [candidates] are tried in order, and the first one that decodes is kept.  Exactly
//! one thread decodes a given locator at a time; everyone else waits for its result.
//!
//! - Changing the theme or density advances the settings' epoch.  Handles compare epochs on access and resolve again
//!   when theirs is stale, so nothing has to walk the cache.
//! - Small icons stay resident.  Large images live in a cost-bounded [ReclaimablePool] which only weakly backs their
//!   handles, so they can be freed under memory pressure and transparently decoded again.
//! - Disabled (grayed-out) and transparent variants come from a [DerivedCache] keyed by the identity of the asset they
//!   were made from, and disappear along with it.
//!
//! Missing or broken icons are the zero-size empty asset, so painting code never has to check for them, unless the
//! cache is configured as strict, in which case [AssetHandle::try_asset] explains what went wrong.
//!
//! To use this crate, implement (or pick) a [ResourceLookup] and a [Decoder], then construct an [IconCache] with your
//! chosen [IconCacheConfig].  [FilesystemLookup] and, with the `image` feature, [ImageDecoder] cover the common case.
mod derived;
mod epoch_lazy;
mod error;
mod filesystem_lookup;
mod filters;
mod handle;
mod icon_cache;
#[cfg(feature = "image")]
mod image_decoder;
mod locator;
mod pipeline;
mod pixels;
mod reclaimable_pool;
mod settings;
mod traits;
mod variants;

#[cfg(test)]
mod testing;

pub use derived::*;
pub use epoch_lazy::*;
pub use error::*;
pub use filesystem_lookup::*;
pub use filters::*;
pub use handle::*;
pub use icon_cache::*;
#[cfg(feature = "image")]
pub use image_decoder::*;
pub use locator::*;
pub use pixels::*;
pub use reclaimable_pool::*;
pub use settings::*;
pub use traits::*;
pub use variants::*;
