//! File-level pipelines: decode, extract transparency, encode, validate.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage, RgbaImage};

use crate::chroma_key::{chromakey, white_to_transparent, ChromaKeyOptions};
use crate::error::{Error, Result};
use crate::flood_fill::{remove_solid_background, FloodFillOptions};
use crate::matting::{difference_matte, MatteOptions};
use crate::similarity::{check_similarity, SimilarityResult, DEFAULT_SIMILARITY_THRESHOLD};
use crate::validation::{validate, validate_rgba, ValidationOptions, ValidationResult};

/// Options shared by every pipeline.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Difference matting settings.
    pub matte: MatteOptions,
    /// Thresholds for the post-extraction check.
    pub validation: ValidationOptions,
    /// Skip the post-extraction check.
    pub skip_validation: bool,
    /// Compare the black/white pair before matting.
    pub check_similarity: bool,
    /// Minimum similarity score before a composition warning is logged.
    pub similarity_threshold: f32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            matte: MatteOptions::default(),
            validation: ValidationOptions::default(),
            skip_validation: false,
            check_similarity: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Single-image background removal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Hard removal of the corner-connected solid background.
    FloodFill(FloodFillOptions),
    /// Distance-based keying against one color.
    ChromaKey(ChromaKeyOptions),
    /// Near-white pixels become transparent.
    WhiteToTransparent {
        /// Per-channel distance from pure white.
        tolerance: u8,
    },
}

/// Result of running a pipeline on files.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Path the RGBA PNG was written to.
    pub output: PathBuf,
    /// Similarity of the input pair, when checked.
    pub similarity: Option<SimilarityResult>,
    /// Validation outcome, unless validation was skipped.
    pub validation: Option<ValidationResult>,
}

impl ProcessResult {
    /// Whether the output passed validation (or validation was skipped).
    #[must_use]
    pub fn passed(&self) -> bool {
        self.validation.as_ref().is_none_or(|v| v.passed)
    }

    /// Turn a failed validation into [`Error::ValidationFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`] with the validator's message.
    pub fn require_valid(self) -> Result<Self> {
        match &self.validation {
            Some(v) if !v.passed => Err(Error::ValidationFailed(v.message.clone())),
            _ => Ok(self),
        }
    }
}

/// Difference-matte a black/white render pair into an RGBA PNG.
///
/// The PNG is written even when validation fails so it can be inspected.
///
/// # Errors
///
/// Returns an error if an input is missing or cannot be decoded, the
/// dimensions differ, or the output cannot be written.
pub fn process_pair(
    black_path: &Path,
    white_path: &Path,
    output: &Path,
    opts: &ProcessOptions,
) -> Result<ProcessResult> {
    let black = load_rgb(black_path)?;
    let white = load_rgb(white_path)?;

    let similarity = if opts.check_similarity {
        let result = check_similarity(&black, &white, opts.similarity_threshold)?;
        if !result.is_similar {
            log::warn!(
                "images may have different compositions (similarity: {:.3}); \
                 transparency extraction may be poor",
                result.score
            );
        }
        Some(result)
    } else {
        None
    };

    let rgba = difference_matte(&black, &white, opts.matte.alpha_floor)?;
    let mut result = finish(&rgba, output, opts)?;
    result.similarity = similarity;
    Ok(result)
}

/// Remove the background of a single image into an RGBA PNG.
///
/// # Errors
///
/// Returns an error if the input is missing or cannot be decoded, the
/// background is ambiguous, or the output cannot be written.
pub fn process_single(
    input: &Path,
    output: &Path,
    mode: KeyMode,
    opts: &ProcessOptions,
) -> Result<ProcessResult> {
    let rgba = match mode {
        KeyMode::FloodFill(flood) => {
            let rgb = load_rgb(input)?;
            remove_solid_background(&rgb, flood.key_color, flood.tolerance)?
        }
        KeyMode::ChromaKey(key) => {
            chromakey(&load_rgba(input)?, key.key_color, key.tolerance, key.cutoff)
        }
        KeyMode::WhiteToTransparent { tolerance } => {
            white_to_transparent(&load_rgba(input)?, tolerance)
        }
    };
    finish(&rgba, output, opts)
}

/// Validate an image file on disk.
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be decoded, or the
/// thresholds are invalid.
pub fn validate_file(path: &Path, opts: &ValidationOptions) -> Result<ValidationResult> {
    ensure_exists(path)?;
    let img = image::open(path).map_err(Error::DecodeFailure)?;
    validate(&img, opts)
}

fn finish(rgba: &RgbaImage, output: &Path, opts: &ProcessOptions) -> Result<ProcessResult> {
    save_png(rgba, output)?;
    log::info!("created transparent PNG: {}", output.display());

    let validation = (!opts.skip_validation)
        .then(|| validate_rgba(rgba, &opts.validation))
        .transpose()?;
    Ok(ProcessResult {
        output: output.to_path_buf(),
        similarity: None,
        validation,
    })
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("image not found: {}", path.display()),
        )))
    }
}

/// Decode an image file into a 3-channel buffer.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file does not exist and
/// [`Error::DecodeFailure`] if it cannot be decoded.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    ensure_exists(path)?;
    Ok(image::open(path).map_err(Error::DecodeFailure)?.to_rgb8())
}

/// Decode an image file into a 4-channel buffer (opaque if it had no alpha).
///
/// # Errors
///
/// Returns [`Error::Io`] if the file does not exist and
/// [`Error::DecodeFailure`] if it cannot be decoded.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    ensure_exists(path)?;
    Ok(image::open(path).map_err(Error::DecodeFailure)?.to_rgba8())
}

/// Save an RGBA image as PNG, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if `path` does not end in `.png`,
/// or an I/O or encoding error if writing fails.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Png) => {}
        Ok(format) => return Err(Error::UnsupportedFormat(format!("{format:?}"))),
        Err(e) => return Err(Error::UnsupportedFormat(e.to_string())),
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"logo.jpg"` becomes `"logo_transparent.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_transparent.png"))
}
