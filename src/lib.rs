//! Extract transparency from flat-background logo renders.
//!
//! Image generators rarely emit a usable alpha channel. This crate recovers
//! one from what they do emit:
//!
//! - [`difference_matte`]: the same logo rendered on pure black and pure
//!   white yields exact alpha and foreground color per pixel.
//! - [`remove_solid_background`]: flood fill from the four corners removes a
//!   solid background with a hard edge.
//! - [`chromakey_soft`]: distance to a key color gives a smooth alpha ramp on
//!   anti-aliased edges; [`white_to_transparent`] is its hard-cutoff cousin.
//!
//! [`validate`] then checks that the result looks like a centered logo on a
//! cleared background, and [`check_similarity`] verifies that a black/white
//! pair actually shows the same composition before matting.
//!
//! # Quick Start
//!
//! ```no_run
//! use logo_transparency::{difference_matte, validate_rgba, ValidationOptions, DEFAULT_ALPHA_FLOOR};
//!
//! let black = image::open("logo_black.png").unwrap().to_rgb8();
//! let white = image::open("logo_white.png").unwrap().to_rgb8();
//! let rgba = difference_matte(&black, &white, DEFAULT_ALPHA_FLOOR).expect("same size");
//!
//! let report = validate_rgba(&rgba, &ValidationOptions::default()).unwrap();
//! println!("{}", report.message);
//! rgba.save("logo.png").unwrap();
//! ```
//!
//! # Single image
//!
//! ```no_run
//! use logo_transparency::{chromakey_soft, remove_solid_background, Color};
//!
//! let rgb = image::open("logo_magenta.png").unwrap().to_rgb8();
//! // Auto-detect the background from the corners.
//! let hard = remove_solid_background(&rgb, None, 30).unwrap();
//!
//! let rgba = image::open("logo_magenta.png").unwrap().to_rgba8();
//! let soft = chromakey_soft(&rgba, Color::MAGENTA, 70);
//! # let _ = (hard, soft);
//! ```

#![deny(missing_docs)]

pub mod chroma_key;
mod engine;
pub mod error;
pub mod flood_fill;
pub mod matting;
pub mod pixel;
pub mod similarity;
pub mod validation;

pub use chroma_key::{chromakey, chromakey_soft, white_to_transparent, ChromaKeyOptions, Cutoff};
pub use engine::{
    default_output_path, load_rgb, load_rgba, process_pair, process_single, save_png,
    validate_file, KeyMode, ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use flood_fill::{remove_solid_background, FloodFillOptions};
pub use matting::{difference_matte, MatteOptions, DEFAULT_ALPHA_FLOOR};
pub use pixel::{AlphaMask, Color};
pub use similarity::{check_similarity, SimilarityMethod, SimilarityResult};
pub use validation::{validate, validate_rgba, ValidationOptions, ValidationResult};
