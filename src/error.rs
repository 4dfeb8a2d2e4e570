use crate::Locator;

/// Reasons a locator failed to produce a usable asset.
///
/// Only [IconError::NotFound] and [IconError::DecodeFailed] ever leave the crate, and only in strict mode: the cache
/// swallows per-candidate failures while it walks the variant list, and normalizes degenerate images to the empty
/// sentinel.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IconError {
    #[error("no variant of {locator} could be found")]
    NotFound { locator: Locator },
    #[error("{locator} could not be decoded: {reason}")]
    DecodeFailed { locator: Locator, reason: String },
    #[error("{locator} decoded to a zero-area image")]
    Degenerate { locator: Locator },
}

impl IconError {
    pub fn locator(&self) -> &Locator {
        match self {
            IconError::NotFound { locator }
            | IconError::DecodeFailed { locator, .. }
            | IconError::Degenerate { locator } => locator,
        }
    }
}

/// A pixel buffer was built from data whose length doesn't match its dimensions.
#[derive(Debug, thiserror::Error)]
#[error("pixel data holds {actual} bytes but {width}x{height} RGBA needs {expected}")]
pub struct BufferSizeError {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}
