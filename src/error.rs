//! Error types for the logo-transparency crate.

/// Errors that can occur while extracting or checking transparency.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two images taking part in one operation differ in size.
    #[error(
        "image dimensions differ: expected {}x{}, got {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    DimensionMismatch {
        /// Dimensions of the first image `(width, height)`.
        expected: (u32, u32),
        /// Dimensions of the second image `(width, height)`.
        actual: (u32, u32),
    },

    /// The four corners disagree too much to auto-detect a background color.
    #[error(
        "corners have different colors (std: [{:.1}, {:.1}, {:.1}], tolerance {tolerance}); \
         specify a key color explicitly",
        std_dev[0], std_dev[1], std_dev[2]
    )]
    AmbiguousBackground {
        /// Per-channel standard deviation of the corner samples.
        std_dev: [f32; 3],
        /// Tolerance the deviation was compared against.
        tolerance: u8,
    },

    /// An input image could not be decoded.
    #[error("failed to load image: {0}")]
    DecodeFailure(image::ImageError),

    /// The produced image does not meet the transparency thresholds.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A color string could not be parsed.
    #[error("invalid color {0:?}: expected #rrggbb, #rgb or r,g,b")]
    InvalidColor(String),

    /// A tuning parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
