//! Decoded pixel data, and the shared empty asset handed out whenever nothing better exists.
use std::sync::{Arc, OnceLock};

use crate::{BufferSizeError, IconError, Locator};

/// Row-major RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

impl PixelBuffer {
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<PixelBuffer, BufferSizeError> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(BufferSizeError {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(PixelBuffer {
            width,
            height,
            data,
        })
    }

    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(byte_len(width, height))
            .collect();
        PixelBuffer {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[start..start + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Draw this buffer into a new one of the given size, sampling the nearest source pixel.
    pub fn resample(&self, width: u32, height: u32) -> PixelBuffer {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return PixelBuffer::transparent(width, height);
        }

        let mut data = Vec::with_capacity(byte_len(width, height));
        for y in 0..height as u64 {
            let sy = (y * self.height as u64 / height as u64) as usize;
            for x in 0..width as u64 {
                let sx = (x * self.width as u64 / width as u64) as usize;
                let start = (sy * self.width as usize + sx) * 4;
                data.extend_from_slice(&self.data[start..start + 4]);
            }
        }

        PixelBuffer {
            width,
            height,
            data,
        }
    }

    /// Approximate memory held by this buffer, in bytes.
    pub fn estimate_cost(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A decoded image and the number of pixels per logical pixel it was decoded at.
///
/// Callers lay out by the logical size: a 32x32 `@2x` file is a 16x16 asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAsset {
    buffer: PixelBuffer,
    scale: u32,
}

static EMPTY: OnceLock<Arc<DecodedAsset>> = OnceLock::new();

impl DecodedAsset {
    pub fn new(buffer: PixelBuffer, scale: u32) -> DecodedAsset {
        DecodedAsset {
            buffer,
            scale: scale.max(1),
        }
    }

    /// The canonical zero-size asset.  Painting it is a no-op; it is what callers get instead of a missing image.
    pub fn empty() -> Arc<DecodedAsset> {
        EMPTY
            .get_or_init(|| Arc::new(DecodedAsset::new(PixelBuffer::transparent(0, 0), 1)))
            .clone()
    }

    pub fn is_empty_sentinel(this: &Arc<DecodedAsset>) -> bool {
        EMPTY.get().map_or(false, |e| Arc::ptr_eq(e, this))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width / self.scale
    }

    pub fn height(&self) -> u32 {
        self.buffer.height / self.scale
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() < 1 || self.height() < 1
    }

    /// Reject degenerate assets so the caller can swap in the empty sentinel.
    pub(crate) fn check_size(self, locator: &Locator) -> Result<DecodedAsset, IconError> {
        if self.is_degenerate() {
            return Err(IconError::Degenerate {
                locator: locator.clone(),
            });
        }
        Ok(self)
    }

    pub fn estimate_cost(&self) -> u64 {
        self.buffer.estimate_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_checked() {
        let err = PixelBuffer::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(err.expected, 16);
        assert_eq!(err.actual, 15);
        assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_logical_size_follows_scale() {
        let asset = DecodedAsset::new(PixelBuffer::transparent(32, 20), 2);
        assert_eq!((asset.width(), asset.height()), (16, 10));
        assert!(!asset.is_degenerate());

        // A 1 pixel tall image at scale 2 has no logical height.
        let thin = DecodedAsset::new(PixelBuffer::transparent(32, 1), 2);
        assert!(thin.is_degenerate());
        assert!(thin.check_size(&Locator::from("thin.png")).is_err());
    }

    #[test]
    fn test_empty_sentinel() {
        let a = DecodedAsset::empty();
        let b = DecodedAsset::empty();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!((a.width(), a.height()), (0, 0));
        assert!(DecodedAsset::is_empty_sentinel(&a));

        let other = Arc::new(DecodedAsset::new(PixelBuffer::transparent(0, 0), 1));
        assert!(!DecodedAsset::is_empty_sentinel(&other));
    }

    #[test]
    fn test_resample_nearest() {
        let mut src = PixelBuffer::transparent(2, 1);
        src.data_mut()[..4].copy_from_slice(&[255, 0, 0, 255]);
        src.data_mut()[4..].copy_from_slice(&[0, 0, 255, 255]);

        let up = src.resample(4, 2);
        assert_eq!(up.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(up.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(up.pixel(2, 0), Some([0, 0, 255, 255]));
        assert_eq!(up.pixel(3, 1), Some([0, 0, 255, 255]));
        assert_eq!(up.pixel(4, 0), None);
    }
}
