//! Transparency quality checks.
//!
//! The checks assume a centered subject on an otherwise cleared background:
//! enough of the image must be transparent and the corners must be clear.
//! This is a heuristic for logos, not a general quality metric; off-center
//! or full-bleed artwork will fail it even when the alpha is correct.

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::pixel::corner_coords;

/// Default minimum share of transparent pixels, in percent.
pub const DEFAULT_MIN_TRANSPARENT_PCT: f32 = 5.0;
/// Default minimum number of transparent corners (out of four).
pub const DEFAULT_MIN_CORNERS: u8 = 3;
/// Default alpha below which a pixel counts as transparent.
pub const DEFAULT_TRANSPARENT_ALPHA: u8 = 25;

/// Thresholds for [`validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationOptions {
    /// Minimum percentage of pixels with alpha below `alpha_threshold`.
    pub min_pct: f32,
    /// Minimum number of corners with alpha below `alpha_threshold`.
    pub min_corners: u8,
    /// Alpha strictly below this value counts as transparent.
    pub alpha_threshold: u8,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_pct: DEFAULT_MIN_TRANSPARENT_PCT,
            min_corners: DEFAULT_MIN_CORNERS,
            alpha_threshold: DEFAULT_TRANSPARENT_ALPHA,
        }
    }
}

/// Measured transparency metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValidationMetrics {
    /// Percentage of transparent pixels, `0.0..=100.0`.
    pub transparent_pct: f32,
    /// Number of transparent corners, `0..=4`.
    pub corners_transparent: u8,
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether every check passed.
    pub passed: bool,
    /// Human-readable summary or the reason for failure.
    pub message: String,
    /// Metrics gathered before the first failing check.
    pub metrics: ValidationMetrics,
}

impl ValidationResult {
    fn fail(message: String, metrics: ValidationMetrics) -> Self {
        Self {
            passed: false,
            message,
            metrics,
        }
    }
}

/// Validate any decoded image; images without an alpha channel fail.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `min_pct` is not finite.
pub fn validate(img: &DynamicImage, opts: &ValidationOptions) -> Result<ValidationResult> {
    ensure_finite_pct(opts.min_pct)?;
    if !img.color().has_alpha() {
        return Ok(ValidationResult::fail(
            "No alpha channel found".to_string(),
            ValidationMetrics::default(),
        ));
    }
    validate_rgba(&img.to_rgba8(), opts)
}

/// Validate an RGBA image.
///
/// Checks run in order and stop at the first failure:
/// 1. transparent pixel share `>= min_pct`
/// 2. transparent corners `>= min_corners`
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `min_pct` is not finite.
pub fn validate_rgba(img: &RgbaImage, opts: &ValidationOptions) -> Result<ValidationResult> {
    ensure_finite_pct(opts.min_pct)?;
    let mut metrics = ValidationMetrics {
        transparent_pct: transparent_percentage(img, opts.alpha_threshold),
        corners_transparent: 0,
    };

    if metrics.transparent_pct < opts.min_pct {
        return Ok(ValidationResult::fail(
            format!(
                "Only {:.1}% transparent (need {}%)",
                metrics.transparent_pct, opts.min_pct
            ),
            metrics,
        ));
    }

    metrics.corners_transparent = transparent_corners(img, opts.alpha_threshold);
    if metrics.corners_transparent < opts.min_corners {
        return Ok(ValidationResult::fail(
            format!(
                "Only {}/4 corners transparent (need {})",
                metrics.corners_transparent, opts.min_corners
            ),
            metrics,
        ));
    }

    log::debug!(
        "validation passed: {:.1}% transparent, {} corners",
        metrics.transparent_pct,
        metrics.corners_transparent
    );
    Ok(ValidationResult {
        passed: true,
        message: format!(
            "Valid: {:.1}% transparent, {}/4 corners clear",
            metrics.transparent_pct, metrics.corners_transparent
        ),
        metrics,
    })
}

fn ensure_finite_pct(min_pct: f32) -> Result<()> {
    if min_pct.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "minimum transparent percentage must be finite, got {min_pct}"
        )))
    }
}

/// Percentage of pixels with alpha below `alpha_threshold`; 0 for empty images.
#[must_use]
pub fn transparent_percentage(img: &RgbaImage, alpha_threshold: u8) -> f32 {
    let total = img.width() as usize * img.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let transparent = img.pixels().filter(|px| px[3] < alpha_threshold).count();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    {
        (transparent as f64 * 100.0 / total as f64) as f32
    }
}

/// Number of corners with alpha below `alpha_threshold`; 0 for empty images.
#[must_use]
pub fn transparent_corners(img: &RgbaImage, alpha_threshold: u8) -> u8 {
    corner_coords(img.width(), img.height()).map_or(0, |corners| {
        let count = corners
            .iter()
            .filter(|&&(x, y)| img.get_pixel(x, y)[3] < alpha_threshold)
            .count();
        u8::try_from(count).unwrap_or(u8::MAX)
    })
}
