//! Distance-based chroma keying on a single image.
//!
//! Every pixel is keyed independently against one key color, with no
//! connectivity search. Two cutoffs are available:
//!
//! - [`Cutoff::Soft`]: Euclidean RGB distance with three zones. Below
//!   `tolerance` the pixel is cleared, between `tolerance` and
//!   `3 * tolerance` alpha ramps linearly (rebuilding anti-aliased edges),
//!   beyond that alpha is left alone.
//! - [`Cutoff::Hard`]: a pixel whose every channel is within `tolerance` of
//!   the key becomes the key color at alpha 0, everything else is untouched.
//!
//! [`white_to_transparent`] is the hard cutoff with a white key.

use image::RgbaImage;

use crate::pixel::Color;

/// Default tolerance for the soft key.
pub const DEFAULT_SOFT_TOLERANCE: u8 = 70;

/// Default tolerance for [`white_to_transparent`].
pub const DEFAULT_WHITE_TOLERANCE: u8 = 10;

/// Width of the alpha ramp as a multiple of the tolerance.
///
/// The ramp spans `tolerance ..= (1 + RAMP_WIDTH_FACTOR) * tolerance`. This
/// is an empirical default, not a physical constant.
pub const RAMP_WIDTH_FACTOR: f32 = 2.0;

/// How pixels near the key color are turned transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cutoff {
    /// Euclidean distance with a linear alpha ramp.
    #[default]
    Soft,
    /// Per-channel match, binary result.
    Hard,
}

/// Options for [`chromakey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaKeyOptions {
    /// Color to key out.
    pub key_color: Color,
    /// Distance (soft) or per-channel (hard) tolerance.
    pub tolerance: u8,
    /// Cutoff shape.
    pub cutoff: Cutoff,
}

impl Default for ChromaKeyOptions {
    fn default() -> Self {
        Self {
            key_color: Color::MAGENTA,
            tolerance: DEFAULT_SOFT_TOLERANCE,
            cutoff: Cutoff::Soft,
        }
    }
}

/// Key `key_color` out of `img` with the given cutoff.
///
/// Returns a new image; `img` is not modified.
#[must_use]
pub fn chromakey(img: &RgbaImage, key_color: Color, tolerance: u8, cutoff: Cutoff) -> RgbaImage {
    let mut out = img.clone();
    let key_px = |px: &mut [u8]| match cutoff {
        Cutoff::Soft => {
            let distance = key_color.distance([px[0], px[1], px[2]]);
            px[3] = soft_key_alpha(distance, tolerance, px[3]);
        }
        Cutoff::Hard => {
            if key_color.matches_within([px[0], px[1], px[2]], tolerance) {
                px.copy_from_slice(&[key_color.r, key_color.g, key_color.b, 0]);
            }
        }
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_exact_mut(4).for_each(key_px);
    }

    #[cfg(not(feature = "rayon"))]
    {
        out.chunks_exact_mut(4).for_each(key_px);
    }

    out
}

/// Soft chroma key: smooth alpha from the distance to `key_color`.
#[must_use]
pub fn chromakey_soft(img: &RgbaImage, key_color: Color, tolerance: u8) -> RgbaImage {
    chromakey(img, key_color, tolerance, Cutoff::Soft)
}

/// Turn near-white pixels (all channels `>= 255 - tolerance`) transparent.
#[must_use]
pub fn white_to_transparent(img: &RgbaImage, tolerance: u8) -> RgbaImage {
    chromakey(img, Color::WHITE, tolerance, Cutoff::Hard)
}

/// Alpha for a pixel at `distance` from the key, given its current alpha.
///
/// - `distance < tolerance`: 0
/// - `tolerance <= distance < 3 * tolerance`: `255 * (d - t) / (2t)`, never
///   above `current`
/// - otherwise: `current`
#[must_use]
pub fn soft_key_alpha(distance: f32, tolerance: u8, current: u8) -> u8 {
    let t = f32::from(tolerance);
    let ramp_end = t * (1.0 + RAMP_WIDTH_FACTOR);

    if distance < t {
        0
    } else if distance < ramp_end {
        let ramp = 255.0 * (distance - t) / (RAMP_WIDTH_FACTOR * t);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ramp = ramp.clamp(0.0, 255.0) as u8;
        ramp.min(current)
    } else {
        current
    }
}
