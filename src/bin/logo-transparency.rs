use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgGroup, Args, Parser, Subcommand};

use logo_transparency::chroma_key::{DEFAULT_SOFT_TOLERANCE, DEFAULT_WHITE_TOLERANCE};
use logo_transparency::flood_fill::DEFAULT_FLOOD_TOLERANCE;
use logo_transparency::similarity::{check_similarity_with, DEFAULT_SIMILARITY_THRESHOLD};
use logo_transparency::{
    default_output_path, load_rgb, process_pair, process_single, validate_file, ChromaKeyOptions,
    Color, Cutoff, FloodFillOptions, KeyMode, MatteOptions, ProcessOptions, ProcessResult,
    Error, Result, SimilarityMethod, ValidationOptions, ValidationResult, DEFAULT_ALPHA_FLOOR,
};

#[derive(Parser)]
#[command(
    name = "logo-transparency",
    about = "Extract transparent PNGs from flat-background logo renders",
    version,
    after_help = "Best quality: render the logo twice, on pure black and pure white, and run\n\
                  `logo-transparency matte BLACK WHITE OUTPUT`."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Difference-matte a black-background and white-background render pair
    Matte {
        /// Logo rendered on pure black
        black: PathBuf,
        /// Logo rendered on pure white
        white: PathBuf,
        /// Output PNG path
        output: PathBuf,

        /// Minimum alpha to divide by when recovering color
        #[arg(long, default_value_t = DEFAULT_ALPHA_FLOOR)]
        alpha_threshold: f32,

        /// Check that both renders share the same composition first
        #[arg(long)]
        check_similarity: bool,

        /// Minimum similarity score for the composition check
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        similarity_threshold: f32,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Remove a solid background by flood fill from the corners
    RemoveBg {
        /// Input image
        input: PathBuf,
        /// Output PNG path (default: {name}_transparent.png)
        output: Option<PathBuf>,

        #[command(flatten)]
        key: KeyColorArgs,

        /// Per-channel color tolerance
        #[arg(short, long, default_value_t = DEFAULT_FLOOD_TOLERANCE)]
        tolerance: u8,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Key out a color with a smooth distance-based alpha ramp
    #[command(group(ArgGroup::new("key_color").args(["chroma_color", "key"]).required(true)))]
    Chromakey {
        /// Input image
        input: PathBuf,
        /// Output PNG path (default: {name}_transparent.png)
        output: Option<PathBuf>,

        #[command(flatten)]
        key: KeyColorArgs,

        /// Distance below which pixels become fully transparent
        #[arg(short, long, default_value_t = DEFAULT_SOFT_TOLERANCE)]
        tolerance: u8,

        /// Use a hard per-channel cutoff instead of the soft ramp
        #[arg(long)]
        hard: bool,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Make near-white pixels transparent
    WhiteToTransparent {
        /// Input image
        input: PathBuf,
        /// Output PNG path (default: {name}_transparent.png)
        output: Option<PathBuf>,

        /// Per-channel distance from pure white
        #[arg(short, long, default_value_t = DEFAULT_WHITE_TOLERANCE)]
        tolerance: u8,

        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Check an existing PNG against the transparency thresholds
    Validate {
        /// Image to check
        image: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Compare the composition of two images
    Similarity {
        /// First image
        a: PathBuf,
        /// Second image
        b: PathBuf,

        /// Minimum score to count as similar
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f32,

        /// Use mean absolute difference instead of SSIM
        #[arg(long)]
        fallback: bool,
    },
}

#[derive(Args)]
struct ThresholdArgs {
    /// Minimum percentage of transparent pixels
    #[arg(long, default_value_t = 5.0)]
    min_transparent_pct: f32,

    /// Minimum number of transparent corners (0-4)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=4))]
    min_corners: u8,

    /// Alpha below which a pixel counts as transparent
    #[arg(long, default_value_t = 25)]
    transparency_alpha: u8,
}

impl From<&ThresholdArgs> for ValidationOptions {
    fn from(args: &ThresholdArgs) -> Self {
        Self {
            min_pct: args.min_transparent_pct,
            min_corners: args.min_corners,
            alpha_threshold: args.transparency_alpha,
        }
    }
}

#[derive(Args)]
struct ValidationArgs {
    #[command(flatten)]
    thresholds: ThresholdArgs,

    /// Skip transparency validation after creation
    #[arg(long)]
    skip_validation: bool,
}

#[derive(Args)]
struct KeyColorArgs {
    /// Background color as three 0-255 integers
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], conflicts_with = "key")]
    chroma_color: Option<Vec<u8>>,

    /// Background color as #rrggbb
    #[arg(short, long)]
    key: Option<Color>,
}

impl KeyColorArgs {
    fn color(&self) -> Option<Color> {
        match (&self.chroma_color, self.key) {
            (Some(rgb), _) if rgb.len() == 3 => Some(Color::new(rgb[0], rgb[1], rgb[2])),
            (_, key) => key,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let ok = match run(cli.command, cli.quiet) {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("[FAIL] {e}");
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn process_options(validation: &ValidationArgs) -> ProcessOptions {
    ProcessOptions {
        validation: ValidationOptions::from(&validation.thresholds),
        skip_validation: validation.skip_validation,
        ..ProcessOptions::default()
    }
}

fn output_or_default(input: &Path, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| default_output_path(input))
}

/// Run one subcommand; `Ok(false)` means it ran but the result failed checks.
fn run(command: Command, quiet: bool) -> Result<bool> {
    let result = match command {
        Command::Matte {
            black,
            white,
            output,
            alpha_threshold,
            check_similarity,
            similarity_threshold,
            validation,
        } => {
            let opts = ProcessOptions {
                matte: MatteOptions {
                    alpha_floor: alpha_threshold,
                },
                check_similarity,
                similarity_threshold,
                ..process_options(&validation)
            };
            process_pair(&black, &white, &output, &opts)?
        }
        Command::RemoveBg {
            input,
            output,
            key,
            tolerance,
            validation,
        } => {
            let mode = KeyMode::FloodFill(FloodFillOptions {
                key_color: key.color(),
                tolerance,
            });
            let output = output_or_default(&input, output);
            process_single(&input, &output, mode, &process_options(&validation))?
        }
        Command::Chromakey {
            input,
            output,
            key,
            tolerance,
            hard,
            validation,
        } => {
            let key_color = key.color().ok_or_else(|| {
                Error::InvalidParameter("chromakey needs --key or --chroma-color".to_string())
            })?;
            let mode = KeyMode::ChromaKey(ChromaKeyOptions {
                key_color,
                tolerance,
                cutoff: if hard { Cutoff::Hard } else { Cutoff::Soft },
            });
            let output = output_or_default(&input, output);
            process_single(&input, &output, mode, &process_options(&validation))?
        }
        Command::WhiteToTransparent {
            input,
            output,
            tolerance,
            validation,
        } => {
            let output = output_or_default(&input, output);
            let mode = KeyMode::WhiteToTransparent { tolerance };
            process_single(&input, &output, mode, &process_options(&validation))?
        }
        Command::Validate { image, thresholds } => {
            let validation = validate_file(&image, &ValidationOptions::from(&thresholds))?;
            print_validation(&validation, quiet);
            return Ok(validation.passed);
        }
        Command::Similarity {
            a,
            b,
            threshold,
            fallback,
        } => {
            let method = if fallback {
                SimilarityMethod::MeanAbsoluteDifference
            } else {
                SimilarityMethod::Ssim
            };
            let result = check_similarity_with(&load_rgb(&a)?, &load_rgb(&b)?, threshold, method)?;
            if !quiet {
                eprintln!(
                    "Similarity score: {:.3} ({})",
                    result.score,
                    if result.is_similar { "similar" } else { "different" }
                );
            }
            return Ok(result.is_similar);
        }
    };

    print_result(&result, quiet);
    Ok(result.passed())
}

fn print_validation(validation: &ValidationResult, quiet: bool) {
    if validation.passed {
        if !quiet {
            eprintln!("[OK] {}", validation.message);
        }
    } else {
        eprintln!("[FAIL] Validation failed: {}", validation.message);
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    if let Some(similarity) = &result.similarity {
        if !quiet {
            eprintln!("Similarity score: {:.3}", similarity.score);
        }
    }
    if let Some(validation) = &result.validation {
        print_validation(validation, quiet);
    }
    if result.passed() && !quiet {
        println!("Success! Transparent logo saved to: {}", result.output.display());
    }
}
