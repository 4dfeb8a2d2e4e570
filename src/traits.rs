//! The seams between the cache and the outside world.
//!
//! A [ResourceLookup] turns a [Locator] into a stream of encoded bytes, a [Decoder] turns those bytes into pixels, and a
//! [Filter] produces the desaturated pixels used for disabled icons.
use std::io::{Error, Read};

use crate::{Locator, PixelBuffer};

/// "open" a resource and return a reader over its encoded bytes.
///
/// A missing resource should be reported with [std::io::ErrorKind::NotFound]; the cache then moves on to the next
/// variant.
pub trait ResourceLookup: Send + Sync + 'static {
    /// Readers should handle closing in their drop implementations.
    type Reader: Read + Send + 'static;

    fn open(&self, locator: &Locator) -> Result<Self::Reader, Error>;
}

/// A `Decoder` knows how to get from a reader of encoded bytes to pixels in memory.
pub trait Decoder: Send + Sync + 'static {
    type Error: std::error::Error;

    fn decode<R: Read>(&self, reader: R) -> Result<PixelBuffer, Self::Error>;
}

/// Produce a grayed-out copy of a buffer.
pub trait Filter: Send + Sync + 'static {
    /// `intensity` is a percentage in `0..=100`; higher is lighter.
    fn desaturate(&self, buffer: &PixelBuffer, intensity: u8) -> PixelBuffer;
}
