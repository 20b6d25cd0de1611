//! Difference-matte a black/white logo pair into a transparent PNG.
//!
//! Usage:
//! ```sh
//! cargo run --example make_transparent -- logo_black.png logo_white.png logo.png
//! ```

use std::env;
use std::process;

use logo_transparency::{process_pair, ProcessOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <black> <white> <output>", args[0]);
        process::exit(1);
    }

    let opts = ProcessOptions {
        check_similarity: true,
        ..ProcessOptions::default()
    };

    match process_pair(args[1].as_ref(), args[2].as_ref(), args[3].as_ref(), &opts) {
        Ok(result) if result.passed() => println!("Done: {}", result.output.display()),
        Ok(result) => {
            let reason = result
                .validation
                .map(|v| v.message)
                .unwrap_or_default();
            eprintln!("Saved {} but validation failed: {reason}", result.output.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
