use image::{Rgb, RgbImage, Rgba, RgbaImage};
use logo_transparency::{
    check_similarity, chromakey_soft, difference_matte, process_pair, process_single,
    remove_solid_background, validate_rgba, white_to_transparent, Color, Error, FloodFillOptions,
    KeyMode, ProcessOptions, ValidationOptions, DEFAULT_ALPHA_FLOOR,
};

/// Render a 16x16 logo (a diamond of `fg` at partial alpha edges) onto `bg`.
fn render_logo(bg: [u8; 3]) -> RgbImage {
    let fg = [40.0_f32, 90.0, 200.0];
    RgbImage::from_fn(16, 16, |x, y| {
        let d = (i64::from(x) - 8).abs() + (i64::from(y) - 8).abs();
        let alpha = match d {
            0..=3 => 1.0,
            4 => 0.5,
            _ => 0.0,
        };
        let mut px = [0u8; 3];
        for ch in 0..3 {
            let v = fg[ch] * alpha + f32::from(bg[ch]) * (1.0 - alpha);
            px[ch] = v.round() as u8;
        }
        Rgb(px)
    })
}

#[test]
fn fully_transparent_pair_mattes_and_validates() {
    let black = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
    let white = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));

    let rgba = difference_matte(&black, &white, DEFAULT_ALPHA_FLOOR).unwrap();
    assert_eq!(rgba.dimensions(), (10, 10));
    assert!(rgba.pixels().all(|px| px[3] == 0));

    let opts = ValidationOptions {
        min_pct: 5.0,
        min_corners: 3,
        ..ValidationOptions::default()
    };
    let report = validate_rgba(&rgba, &opts).unwrap();
    assert!(report.passed, "{}", report.message);
    assert_eq!(report.metrics.corners_transparent, 4);
}

#[test]
fn rendered_logo_round_trips_through_matting() {
    let black = render_logo([0, 0, 0]);
    let white = render_logo([255, 255, 255]);
    let rgba = difference_matte(&black, &white, DEFAULT_ALPHA_FLOOR).unwrap();

    let center = rgba.get_pixel(8, 8);
    assert_eq!(center.0, [40, 90, 200, 255]);
    assert_eq!(rgba.get_pixel(0, 0)[3], 0);

    let edge = rgba.get_pixel(12, 8);
    assert!((i32::from(edge[3]) - 127).abs() <= 1, "edge alpha {}", edge[3]);

    assert!(validate_rgba(&rgba, &ValidationOptions::default()).unwrap().passed);
}

#[test]
fn matte_rejects_mismatched_pair_without_output() {
    let black = RgbImage::new(10, 10);
    let white = RgbImage::new(11, 10);
    let err = difference_matte(&black, &white, DEFAULT_ALPHA_FLOOR).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: (10, 10),
            actual: (11, 10)
        }
    ));
}

#[test]
fn similarity_accepts_same_composition_on_grey_backgrounds() {
    let a = render_logo([120, 120, 120]);
    let b = render_logo([126, 126, 126]);
    let result = check_similarity(&a, &b, 0.9).unwrap();
    assert!(result.is_similar, "score {}", result.score);
}

#[test]
fn flood_fill_and_soft_key_agree_on_solid_background() {
    let rgb = render_logo([255, 0, 255]);
    let hard = remove_solid_background(&rgb, None, 30).unwrap();
    let rgba = image::DynamicImage::ImageRgb8(rgb).to_rgba8();
    let soft = chromakey_soft(&rgba, Color::MAGENTA, 70);

    // Background corners are cleared by both, the logo center is kept by both.
    for img in [&hard, &soft] {
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(15, 15)[3], 0);
        assert_eq!(img.get_pixel(8, 8)[3], 255);
    }
}

#[test]
fn white_to_transparent_clears_white_logo_background() {
    let rgba = image::DynamicImage::ImageRgb8(render_logo([255, 255, 255])).to_rgba8();
    let out = white_to_transparent(&rgba, 10);
    assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 0]);
    assert_eq!(out.get_pixel(8, 8).0, [40, 90, 200, 255]);
}

#[test]
fn pipeline_writes_rgba_png_and_reports_validation() {
    let dir = tempfile::tempdir().unwrap();
    let black_path = dir.path().join("black.png");
    let white_path = dir.path().join("white.png");
    let output = dir.path().join("out/logo.png");
    render_logo([0, 0, 0]).save(&black_path).unwrap();
    render_logo([255, 255, 255]).save(&white_path).unwrap();

    let opts = ProcessOptions {
        check_similarity: true,
        ..ProcessOptions::default()
    };
    let result = process_pair(&black_path, &white_path, &output, &opts).unwrap();
    assert!(result.passed());
    assert!(result.similarity.is_some());
    assert!(result.validation.as_ref().is_some_and(|v| v.passed));

    let written = image::open(&output).unwrap();
    assert!(written.color().has_alpha());
    assert_eq!(written.to_rgba8().get_pixel(0, 0)[3], 0);
}

#[test]
fn pipeline_keeps_output_when_validation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("opaque.png");
    let output = dir.path().join("opaque_out.png");
    RgbaImage::from_pixel(8, 8, Rgba([10, 200, 10, 255]))
        .save(&input)
        .unwrap();

    let mode = KeyMode::WhiteToTransparent { tolerance: 10 };
    let result = process_single(&input, &output, mode, &ProcessOptions::default()).unwrap();
    assert!(!result.passed());
    assert!(output.exists());
    assert!(matches!(
        result.require_valid(),
        Err(Error::ValidationFailed(msg)) if msg.starts_with("Only 0.0% transparent")
    ));
}

#[test]
fn pipeline_reports_ambiguous_background() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("corners.png");
    let mut img = RgbImage::from_pixel(6, 6, Rgb([0, 0, 0]));
    img.put_pixel(5, 5, Rgb([255, 255, 255]));
    img.put_pixel(0, 5, Rgb([255, 255, 255]));
    img.save(&input).unwrap();

    let mode = KeyMode::FloodFill(FloodFillOptions::default());
    let err = process_single(&input, &dir.path().join("o.png"), mode, &ProcessOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousBackground { .. }));
}

#[test]
fn skip_validation_leaves_no_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    RgbImage::from_pixel(4, 4, Rgb([255, 0, 255])).save(&input).unwrap();

    let opts = ProcessOptions {
        skip_validation: true,
        ..ProcessOptions::default()
    };
    let mode = KeyMode::FloodFill(FloodFillOptions {
        key_color: Some(Color::MAGENTA),
        tolerance: 0,
    });
    let result = process_single(&input, &dir.path().join("out.png"), mode, &opts).unwrap();
    assert!(result.validation.is_none());
    assert!(result.passed());
}
