//! A [Decoder] for the formats the `image` crate was built with (PNG, JPEG and GIF by default).
use std::io::Read;

use crate::*;

#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("could not read image bytes")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Size(#[from] BufferSizeError),
}

/// Decodes anything `image` can guess the format of into RGBA8.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    type Error = ImageDecodeError;

    fn decode<R: Read>(&self, mut reader: R) -> Result<PixelBuffer, ImageDecodeError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(PixelBuffer::from_rgba8(width, height, rgba.into_raw())?)
    }
}
