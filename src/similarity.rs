//! Structural similarity between a black-background and white-background pair.
//!
//! Difference matting only works when both renders share the same
//! composition. Both images are converted to grayscale and compared with:
//! 1. **SSIM** (preferred): windowed comparison of local luminance, contrast
//!    and structure, robust to background-only differences
//! 2. **Mean absolute difference** (fallback): `1 - mean(|a - b|) / 255`,
//!    a cruder global metric used when the image is smaller than the SSIM
//!    window or when explicitly requested

use image::{ImageBuffer, Pixel};

use crate::error::Result;
use crate::pixel::{ensure_same_dimensions, luma_plane};

/// Default minimum score for two images to count as similar.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.90;

/// Side length of the square SSIM window.
pub const SSIM_WINDOW: usize = 7;

/// SSIM stabilizer constants for an 8-bit dynamic range.
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Algorithm used to compute a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMethod {
    /// Windowed structural similarity index.
    #[default]
    Ssim,
    /// `1 - mean(|a - b|) / 255` over the whole image.
    MeanAbsoluteDifference,
}

/// Outcome of a similarity check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityResult {
    /// Whether `score >= threshold`.
    pub is_similar: bool,
    /// Similarity in `[0, 1]`.
    pub score: f32,
    /// Method that produced the score.
    pub method: SimilarityMethod,
}

/// Compare two images with SSIM, falling back to mean absolute difference
/// for images smaller than the SSIM window.
///
/// # Errors
///
/// Returns [`crate::Error::DimensionMismatch`] if the images differ in size.
pub fn check_similarity<P>(
    a: &ImageBuffer<P, Vec<u8>>,
    b: &ImageBuffer<P, Vec<u8>>,
    threshold: f32,
) -> Result<SimilarityResult>
where
    P: Pixel<Subpixel = u8>,
{
    check_similarity_with(a, b, threshold, SimilarityMethod::Ssim)
}

/// Compare two images with an explicit method.
///
/// SSIM still falls back to mean absolute difference when either side is
/// smaller than [`SSIM_WINDOW`]; the returned `method` says which ran.
///
/// # Errors
///
/// Returns [`crate::Error::DimensionMismatch`] if the images differ in size.
pub fn check_similarity_with<P>(
    a: &ImageBuffer<P, Vec<u8>>,
    b: &ImageBuffer<P, Vec<u8>>,
    threshold: f32,
    method: SimilarityMethod,
) -> Result<SimilarityResult>
where
    P: Pixel<Subpixel = u8>,
{
    ensure_same_dimensions(a.dimensions(), b.dimensions())?;
    let (width, height) = (a.width() as usize, a.height() as usize);
    let gray_a = luma_plane(a);
    let gray_b = luma_plane(b);

    let ssim_score = match method {
        SimilarityMethod::Ssim => ssim(&gray_a, &gray_b, width, height),
        SimilarityMethod::MeanAbsoluteDifference => None,
    };

    let (score, method) = if let Some(score) = ssim_score {
        (score, SimilarityMethod::Ssim)
    } else {
        log::warn!("using mean absolute difference for similarity; less reliable than SSIM");
        (
            mean_abs_similarity(&gray_a, &gray_b),
            SimilarityMethod::MeanAbsoluteDifference,
        )
    };

    let score = score.clamp(0.0, 1.0);
    log::debug!("similarity score {score:.3} ({method:?})");
    Ok(SimilarityResult {
        is_similar: score >= threshold,
        score,
        method,
    })
}

/// Mean structural similarity of two grayscale planes in `[0, 255]`.
///
/// Uses a uniform 7x7 window with sample covariance and averages over all
/// window centers at least 3 pixels from every border. Returns `None` when
/// the image is smaller than the window. The raw SSIM may be negative.
#[must_use]
pub fn ssim(a: &[f32], b: &[f32], width: usize, height: usize) -> Option<f32> {
    debug_assert_eq!(a.len(), width * height);
    debug_assert_eq!(b.len(), width * height);
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return None;
    }

    let pad = SSIM_WINDOW / 2;
    let rows = pad..height - pad;
    let row_count = rows.len();
    let cols = width - 2 * pad;

    let row_sum = |y: usize| -> f64 { (pad..width - pad).map(|x| window_ssim(a, b, width, x, y)).sum() };

    #[cfg(feature = "rayon")]
    let total: f64 = {
        use rayon::prelude::*;
        rows.into_par_iter().map(row_sum).sum()
    };

    #[cfg(not(feature = "rayon"))]
    let total: f64 = rows.map(row_sum).sum();

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mean = (total / (row_count * cols) as f64) as f32;
    Some(mean)
}

/// SSIM of the window centered on `(cx, cy)`.
fn window_ssim(a: &[f32], b: &[f32], width: usize, cx: usize, cy: usize) -> f64 {
    let pad = SSIM_WINDOW / 2;
    let mut sum_a = 0.0_f64;
    let mut sum_b = 0.0_f64;
    let mut sum_aa = 0.0_f64;
    let mut sum_bb = 0.0_f64;
    let mut sum_ab = 0.0_f64;

    for y in cy - pad..=cy + pad {
        let row = y * width;
        for x in cx - pad..=cx + pad {
            let va = f64::from(a[row + x]);
            let vb = f64::from(b[row + x]);
            sum_a += va;
            sum_b += vb;
            sum_aa += va * va;
            sum_bb += vb * vb;
            sum_ab += va * vb;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let n = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = n / (n - 1.0);

    let mean_a = sum_a / n;
    let mean_b = sum_b / n;
    let var_a = cov_norm * (sum_aa / n - mean_a * mean_a);
    let var_b = cov_norm * (sum_bb / n - mean_b * mean_b);
    let cov_ab = cov_norm * (sum_ab / n - mean_a * mean_b);

    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let numerator = (2.0 * mean_a * mean_b + c1) * (2.0 * cov_ab + c2);
    let denominator = (mean_a * mean_a + mean_b * mean_b + c1) * (var_a + var_b + c2);
    numerator / denominator
}

/// `1 - mean(|a - b|) / 255`; 1.0 for empty planes.
#[must_use]
pub fn mean_abs_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 1.0;
    }
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&va, &vb)| f64::from((va - vb).abs()))
        .sum();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mean_diff = (total / a.len() as f64 / 255.0) as f32;
    1.0 - mean_diff
}
