//! The default [Filter], which grays out an icon the same way Swing's `GrayFilter` does, and the alpha pass used for
//! transparent variants.
use crate::{Filter, PixelBuffer};

/// Gray percentage for disabled icons on a light theme.
pub const LIGHT_DISABLED_INTENSITY: u8 = 65;
/// Gray percentage for disabled icons on a dark theme.
pub const DARK_DISABLED_INTENSITY: u8 = 30;

/// Converts every pixel to a brightened gray, keeping its alpha.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrayFilter;

fn gray_level(r: u8, g: u8, b: u8, percent: u8) -> u8 {
    let percent = percent.min(100) as u32;
    let gray = ((0.30 * r as f64 + 0.59 * g as f64 + 0.11 * b as f64) / 3.0) as u32;
    let brightened = 255 - ((255 - gray) * (100 - percent) / 100);
    brightened.min(255) as u8
}

impl Filter for GrayFilter {
    fn desaturate(&self, buffer: &PixelBuffer, intensity: u8) -> PixelBuffer {
        let mut out = buffer.clone();
        for px in out.data_mut().chunks_exact_mut(4) {
            let gray = gray_level(px[0], px[1], px[2], intensity);
            px[0] = gray;
            px[1] = gray;
            px[2] = gray;
        }
        out
    }
}

/// Scale the alpha channel of every pixel by `alpha`, clamped to `0.0..=1.0`.
pub fn apply_alpha(buffer: &PixelBuffer, alpha: f32) -> PixelBuffer {
    let alpha = if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    };
    let mut out = buffer.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        px[3] = (px[3] as f32 * alpha).round() as u8;
    }
    out
}
