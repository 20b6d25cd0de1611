//! Hard background removal by flood fill from the image corners.
//!
//! One fill is seeded at each corner and the four regions are unioned into
//! a single background mask. Seeding every corner catches backgrounds that
//! are split by a subject touching the border, which one fill would miss.
//!
//! Growth uses a floating range: a neighbour joins when every channel is
//! within `tolerance` of the filled pixel it was reached from, so the region
//! follows soft gradients at the edges of the background.

use image::{Luma, RgbImage, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::pixel::{corner_coords, AlphaMask, Color};

/// Default per-channel tolerance for corner detection and fill growth.
pub const DEFAULT_FLOOD_TOLERANCE: u8 = 30;

/// Options for [`remove_solid_background`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodFillOptions {
    /// Background color; `None` auto-detects it from the corners.
    pub key_color: Option<Color>,
    /// Per-channel color tolerance.
    pub tolerance: u8,
}

impl Default for FloodFillOptions {
    fn default() -> Self {
        Self {
            key_color: None,
            tolerance: DEFAULT_FLOOD_TOLERANCE,
        }
    }
}

/// Estimate the background color as the mean of the four corner pixels.
///
/// # Errors
///
/// Returns [`Error::AmbiguousBackground`] when the population standard
/// deviation of any channel across the corners exceeds `tolerance`, and
/// [`Error::InvalidParameter`] for an empty image.
pub fn detect_background_color(img: &RgbImage, tolerance: u8) -> Result<Color> {
    let corners = corner_coords(img.width(), img.height()).ok_or_else(|| {
        Error::InvalidParameter("cannot sample corners of an empty image".to_string())
    })?;

    let samples = corners.map(|(x, y)| img.get_pixel(x, y).0);

    let mut mean = [0.0_f32; 3];
    let mut std_dev = [0.0_f32; 3];
    for ch in 0..3 {
        let values = samples.map(|s| f32::from(s[ch]));
        let m = values.iter().sum::<f32>() / 4.0;
        let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f32>() / 4.0;
        mean[ch] = m;
        std_dev[ch] = variance.sqrt();
    }

    if std_dev.iter().any(|&sd| sd > f32::from(tolerance)) {
        return Err(Error::AmbiguousBackground { std_dev, tolerance });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let key = Color::new(mean[0] as u8, mean[1] as u8, mean[2] as u8);
    log::debug!("auto-detected background color {key}");
    Ok(key)
}

/// Compute the foreground mask: `0` where the corner-connected background
/// was filled, `255` everywhere else.
///
/// Only corners within `tolerance` of `key` on every channel seed a fill.
#[must_use]
pub fn foreground_mask(img: &RgbImage, key: Color, tolerance: u8) -> AlphaMask {
    region_mask(img, &background_region(img, Some(key), tolerance))
}

fn region_mask(img: &RgbImage, background: &[bool]) -> AlphaMask {
    let (width, height) = img.dimensions();
    AlphaMask::from_fn(width, height, |x, y| {
        let idx = y as usize * width as usize + x as usize;
        Luma([if background[idx] { 0 } else { 255 }])
    })
}

/// Remove a solid background by flood filling from the four corners.
///
/// Produces a binary alpha channel: filled background pixels get alpha 0,
/// everything else alpha 255. RGB values are copied unchanged.
///
/// An auto-detected key has already accepted all four corners as
/// background, so every corner seeds a fill. An explicit `key_color` only
/// seeds the corners that match it.
///
/// # Errors
///
/// Returns [`Error::AmbiguousBackground`] when `key_color` is `None` and the
/// corners disagree by more than `tolerance`.
pub fn remove_solid_background(
    img: &RgbImage,
    key_color: Option<Color>,
    tolerance: u8,
) -> Result<RgbaImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Ok(RgbaImage::new(width, height));
    }

    let seed_key = match key_color {
        Some(key) => Some(key),
        None => {
            detect_background_color(img, tolerance)?;
            None
        }
    };

    let mask = region_mask(img, &background_region(img, seed_key, tolerance));
    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        Rgba([r, g, b, mask.get_pixel(x, y)[0]])
    }))
}

/// Union of the four corner-seeded fills as a flat visited arena.
///
/// With `seed_key` set, a corner outside `tolerance` of it does not seed.
fn background_region(img: &RgbImage, seed_key: Option<Color>, tolerance: u8) -> Vec<bool> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut region = vec![false; width * height];
    let Some(corners) = corner_coords(img.width(), img.height()) else {
        return region;
    };

    let raw = img.as_raw();
    let rgb_at = |idx: usize| -> [u8; 3] { [raw[idx * 3], raw[idx * 3 + 1], raw[idx * 3 + 2]] };

    let mut stack = Vec::new();
    for (x, y) in corners {
        let seed = y as usize * width + x as usize;
        let rejected = seed_key.is_some_and(|key| !key.matches_within(rgb_at(seed), tolerance));
        if region[seed] || rejected {
            continue;
        }

        region[seed] = true;
        stack.push(seed);
        while let Some(idx) = stack.pop() {
            let from = Color::from(rgb_at(idx));
            let (cx, cy) = (idx % width, idx / width);

            let neighbours = [
                (cx > 0).then_some(idx.wrapping_sub(1)),
                (cx + 1 < width).then_some(idx + 1),
                (cy > 0).then_some(idx.wrapping_sub(width)),
                (cy + 1 < height).then_some(idx + width),
            ];
            for next in neighbours.into_iter().flatten() {
                if !region[next] && from.matches_within(rgb_at(next), tolerance) {
                    region[next] = true;
                    stack.push(next);
                }
            }
        }
    }

    let filled = region.iter().filter(|&&b| b).count();
    log::debug!(
        "flood fill marked {filled} of {} pixels as background",
        region.len()
    );
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BG: Rgb<u8> = Rgb([255, 0, 255]);
    const FG: Rgb<u8> = Rgb([20, 120, 40]);

    /// 10x10 magenta image with a 4x4 green square in the middle.
    fn centered_logo() -> RgbImage {
        RgbImage::from_fn(10, 10, |x, y| {
            if (3..7).contains(&x) && (3..7).contains(&y) {
                FG
            } else {
                BG
            }
        })
    }

    #[test]
    fn detects_uniform_corner_color() {
        let key = detect_background_color(&centered_logo(), 30).unwrap();
        assert_eq!(key, Color::MAGENTA);
    }

    #[test]
    fn detected_key_is_truncated_corner_mean() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        img.put_pixel(3, 3, Rgb([110, 101, 100]));
        let key = detect_background_color(&img, 30).unwrap();
        // mean red 102.5, green 100.25
        assert_eq!(key, Color::new(102, 100, 100));
    }

    #[test]
    fn divergent_corners_are_ambiguous() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([0, 0, 0]));
        img.put_pixel(4, 4, Rgb([255, 255, 255]));
        img.put_pixel(0, 4, Rgb([255, 255, 255]));
        let err = remove_solid_background(&img, None, 30).unwrap_err();
        match err {
            Error::AmbiguousBackground { std_dev, tolerance } => {
                assert_eq!(tolerance, 30);
                assert!((std_dev[0] - 127.5).abs() < 1e-3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn explicit_key_bypasses_detection() {
        let mut img = centered_logo();
        img.put_pixel(9, 9, Rgb([0, 0, 0]));
        let out = remove_solid_background(&img, Some(Color::MAGENTA), 30).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(9, 9)[3], 255);
    }

    #[test]
    fn removes_background_and_keeps_subject() {
        let out = remove_solid_background(&centered_logo(), None, 30).unwrap();
        for (x, y, px) in out.enumerate_pixels() {
            let inside = (3..7).contains(&x) && (3..7).contains(&y);
            let expected_alpha = if inside { 255 } else { 0 };
            assert_eq!(px[3], expected_alpha, "pixel ({x},{y})");
            let src = if inside { FG } else { BG };
            assert_eq!(&px.0[..3], &src.0);
        }
    }

    #[test]
    fn enclosed_background_island_stays_opaque() {
        // Ring of foreground around a magenta hole: hole is not corner-connected.
        let img = RgbImage::from_fn(9, 9, |x, y| {
            let ring = (2..7).contains(&x) && (2..7).contains(&y);
            let hole = x == 4 && y == 4;
            if ring && !hole {
                FG
            } else {
                BG
            }
        });
        let out = remove_solid_background(&img, None, 30).unwrap();
        assert_eq!(out.get_pixel(4, 4)[3], 255);
        assert_eq!(out.get_pixel(0, 8)[3], 0);
    }

    #[test]
    fn split_background_is_reached_from_every_corner() {
        // A vertical bar touching top and bottom splits the background in two.
        let img = RgbImage::from_fn(9, 5, |x, _| if x == 4 { FG } else { BG });
        let out = remove_solid_background(&img, None, 30).unwrap();
        assert_eq!(out.get_pixel(0, 2)[3], 0);
        assert_eq!(out.get_pixel(8, 2)[3], 0);
        assert_eq!(out.get_pixel(4, 2)[3], 255);
    }

    #[test]
    fn fill_follows_gradual_gradient() {
        // Each column is 20 levels darker than the previous one: neighbours stay
        // within tolerance even though the far side is 180 away from the seed.
        let img = RgbImage::from_fn(10, 3, |x, _| {
            let v = 255 - 20 * x as u8;
            Rgb([v, v, v])
        });
        let mask = foreground_mask(&img, Color::WHITE, 30);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn corner_outside_tolerance_of_key_does_not_seed() {
        let mut img = centered_logo();
        img.put_pixel(0, 0, FG);
        let mask = foreground_mask(&img, Color::MAGENTA, 10);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn auto_detected_key_seeds_every_corner() {
        // Corner std dev is 29.9, so detection accepts the outlier corner even
        // though it sits 69 levels from the detected mean.
        let mut img = RgbImage::from_pixel(10, 10, Rgb([100, 100, 100]));
        img.put_pixel(9, 9, Rgb([169, 169, 169]));
        assert_eq!(detect_background_color(&img, 30).unwrap(), Color::new(117, 117, 117));

        let out = remove_solid_background(&img, None, 30).unwrap();
        assert_eq!(out.get_pixel(9, 9)[3], 0);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(8, 8)[3], 0);
    }

    #[test]
    fn zero_tolerance_fill_is_idempotent() {
        let img = centered_logo();
        let first = remove_solid_background(&img, None, 0).unwrap();
        let second = remove_solid_background(&img, None, 0).unwrap();
        assert_eq!(first, second);

        let rgb = image::DynamicImage::ImageRgba8(first).to_rgb8();
        let again = remove_solid_background(&rgb, None, 0).unwrap();
        assert_eq!(crate::pixel::alpha_mask(&again), crate::pixel::alpha_mask(&second));
    }

    #[test]
    fn empty_image_yields_empty_output() {
        let out = remove_solid_background(&RgbImage::new(0, 0), None, 30).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
        assert!(detect_background_color(&RgbImage::new(0, 3), 30).is_err());
    }

    #[test]
    fn single_pixel_image_is_all_background() {
        let img = RgbImage::from_pixel(1, 1, BG);
        let out = remove_solid_background(&img, None, 30).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 255, 0]);
    }
}
