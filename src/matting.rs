//! Difference matting: recover alpha and foreground color from two renders.
//!
//! The same subject rendered over pure black and pure white obeys
//! `black = fg * alpha` and `white = fg * alpha + 255 * (1 - alpha)`.
//!
//! Solving per pixel:
//! - `alpha = 1 - max(|white - black|) / 255`
//! - `fg = black / alpha` (when `alpha > alpha_floor`)
//!
//! The maximum over R/G/B is the least transparent estimate and avoids
//! false transparency at color boundaries where one channel barely moves.

use image::{RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::pixel::ensure_same_dimensions;

/// Default alpha floor: below this the foreground color is not recovered.
pub const DEFAULT_ALPHA_FLOOR: f32 = 0.01;

/// Options for [`difference_matte`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatteOptions {
    /// Minimum alpha to divide by when recovering foreground color.
    pub alpha_floor: f32,
}

impl Default for MatteOptions {
    fn default() -> Self {
        Self {
            alpha_floor: DEFAULT_ALPHA_FLOOR,
        }
    }
}

/// Build an RGBA image from a black-background and a white-background render.
///
/// Both images must have the same dimensions. Pixels with
/// `alpha <= alpha_floor` keep the black-background color verbatim.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the images differ in size, or
/// [`Error::InvalidParameter`] if `alpha_floor` is not in `[0, 1)`.
pub fn difference_matte(
    black_bg: &RgbImage,
    white_bg: &RgbImage,
    alpha_floor: f32,
) -> Result<RgbaImage> {
    ensure_same_dimensions(black_bg.dimensions(), white_bg.dimensions())?;
    if !(0.0..1.0).contains(&alpha_floor) {
        return Err(Error::InvalidParameter(format!(
            "alpha floor must be in [0, 1), got {alpha_floor}"
        )));
    }

    let (width, height) = black_bg.dimensions();
    let mut out = RgbaImage::new(width, height);
    let black = black_bg.as_raw();
    let white = white_bg.as_raw();

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_exact_mut(4)
            .zip(black.par_chunks_exact(3))
            .zip(white.par_chunks_exact(3))
            .for_each(|((dst, b), w)| matte_pixel(dst, b, w, alpha_floor));
    }

    #[cfg(not(feature = "rayon"))]
    {
        out.chunks_exact_mut(4)
            .zip(black.chunks_exact(3))
            .zip(white.chunks_exact(3))
            .for_each(|((dst, b), w)| matte_pixel(dst, b, w, alpha_floor));
    }

    log::debug!("difference matte computed for {width}x{height} image");
    Ok(out)
}

/// Solve one pixel; `dst` is RGBA, `black` and `white` are RGB.
#[inline]
fn matte_pixel(dst: &mut [u8], black: &[u8], white: &[u8], alpha_floor: f32) {
    let max_diff = black
        .iter()
        .zip(white.iter())
        .map(|(&b, &w)| b.abs_diff(w))
        .max()
        .unwrap_or(0);
    let alpha = 1.0 - f32::from(max_diff) / 255.0;

    for (out, &b) in dst[..3].iter_mut().zip(black) {
        *out = if alpha > alpha_floor {
            let fg = f32::from(b) / alpha.max(alpha_floor);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                fg.clamp(0.0, 255.0) as u8
            }
        } else {
            b
        };
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        dst[3] = (alpha * 255.0).clamp(0.0, 255.0) as u8;
    }
}
