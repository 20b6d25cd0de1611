//! Pixel buffer helpers shared by every engine.
//!
//! 3-channel buffers are [`image::RgbImage`], 4-channel buffers are
//! [`image::RgbaImage`] and alpha masks are [`image::GrayImage`]. This module
//! adds the [`Color`] key type plus the dimension guard, corner sampling and
//! grayscale conversion the engines build on.

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbaImage};

use crate::error::{Error, Result};

/// A single-channel alpha mask, `0` transparent to `255` opaque.
pub type AlphaMask = GrayImage;

/// An opaque RGB color used as a chroma key or validation reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure white, `#ffffff`.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black, `#000000`.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Magenta, `#ff00ff`, the usual chroma background for generated logos.
    pub const MAGENTA: Self = Self::new(255, 0, 255);

    /// Create a color from its three channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The channels as an `[r, g, b]` array.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Euclidean distance to an RGB triple.
    #[must_use]
    pub fn distance(self, rgb: [u8; 3]) -> f32 {
        self.channels()
            .iter()
            .zip(rgb.iter())
            .map(|(&k, &c)| {
                let d = f32::from(c) - f32::from(k);
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }

    /// Whether every channel of `rgb` is within `tolerance` of this color.
    #[must_use]
    pub fn matches_within(self, rgb: [u8; 3], tolerance: u8) -> bool {
        self.channels()
            .iter()
            .zip(rgb.iter())
            .all(|(&k, &c)| k.abs_diff(c) <= tolerance)
    }
}

impl From<Rgb<u8>> for Color {
    fn from(px: Rgb<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Rgb(c.channels())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `r,g,b`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let trimmed = s.trim();

        if trimmed.contains(',') {
            let parts: Vec<u8> = trimmed
                .split(',')
                .map(|p| p.trim().parse::<u8>().map_err(|_| invalid()))
                .collect::<Result<_>>()?;
            return match parts.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b)),
                _ => Err(invalid()),
            };
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc
                let expand = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

/// Fail with [`Error::DimensionMismatch`] unless both sizes are equal.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when the sizes differ.
pub fn ensure_same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Coordinates of the four corners: top-left, top-right, bottom-left, bottom-right.
///
/// Returns `None` for an empty image. For 1-pixel-wide or tall images some
/// corners coincide.
#[must_use]
pub fn corner_coords(width: u32, height: u32) -> Option<[(u32, u32); 4]> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x2, y2) = (width - 1, height - 1);
    Some([(0, 0), (x2, 0), (0, y2), (x2, y2)])
}

/// Luminance of an RGB triple in `[0, 255]`: `0.299*R + 0.587*G + 0.114*B`.
#[must_use]
pub fn luma(rgb: [u8; 3]) -> f32 {
    0.299 * f32::from(rgb[0]) + 0.587 * f32::from(rgb[1]) + 0.114 * f32::from(rgb[2])
}

/// Convert any 8-bit image to a flat grayscale plane in `[0, 255]`.
///
/// Alpha, when present, is ignored.
#[must_use]
pub fn luma_plane<P>(img: &ImageBuffer<P, Vec<u8>>) -> Vec<f32>
where
    P: Pixel<Subpixel = u8>,
{
    img.pixels().map(|px| luma(px.to_rgb().0)).collect()
}

/// Extract the alpha channel of an RGBA image as a standalone mask.
#[must_use]
pub fn alpha_mask(img: &RgbaImage) -> AlphaMask {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[3]])
    })
}
