//! Replace the key green with transparency.
//!
//! Old sprite sets often come as bitmaps without an alpha channel and use
//! pure green `(0, 255, 0)` to mark the background. The functions here
//! promote such images to RGBA and turn every pixel of exactly that color
//! into `(0, 0, 0, 0)`. There is no tolerance: `(1, 255, 0)` stays opaque.

use crate::{
    files::{self, BatchReport, OutputClaims},
    AssetError, Result,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, Rgba, RgbaImage};
use log::info;
use std::path::{Path, PathBuf};

/// The color that is keyed out.
pub const KEY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// What a keyed pixel is replaced with.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Is this pixel the key color? Alpha is ignored.
pub fn is_key_color(pixel: &Rgba<u8>) -> bool {
    pixel.0[..3] == KEY_COLOR.0
}

/// Replace every key-colored pixel with [TRANSPARENT], in place.
///
/// Returns the number of replaced pixels.
pub fn key_out(image: &mut RgbaImage) -> usize {
    let mut replaced = 0;
    for pixel in image.pixels_mut() {
        if is_key_color(pixel) {
            *pixel = TRANSPARENT;
            replaced += 1;
        }
    }
    replaced
}

/// Promote `image` to RGBA and key out the green.
///
/// Images without an alpha channel get a fully opaque one first. Pixels that
/// do not match the key color are passed through unchanged.
pub fn apply_color_key(image: DynamicImage) -> RgbaImage {
    let mut rgba = image.into_rgba8();
    key_out(&mut rgba);
    rgba
}

/// Key out a single image file and write it as `<output_dir>/<stem>.png`.
///
/// Returns the path of the written file.
pub fn convert_file(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let source = image::open(input).map_err(|err| AssetError::image(input, err))?;
    let (width, height) = source.dimensions();
    let mut rgba = source.into_rgba8();
    let replaced = key_out(&mut rgba);

    let output = files::output_path(output_dir, input, "png")?;
    rgba.save_with_format(&output, ImageFormat::Png)
        .map_err(|err| AssetError::image(&output, err))?;
    info!(
        "Converted {} -> {} ({}x{}, {} pixels keyed)",
        input.display(),
        output.display(),
        width,
        height,
        replaced
    );
    Ok(output)
}

/// Configuration of [convert_dir].
#[derive(Debug, Clone)]
pub struct ColorKeyOptions {
    /// Directory with the source images. Not searched recursively.
    pub input_dir: PathBuf,
    /// Where the PNGs are written. Created if missing.
    pub output_dir: PathBuf,
}

impl ColorKeyOptions {
    /// Check the input directory and create the output directory.
    pub fn validate(&self) -> Result<()> {
        files::require_dir(&self.input_dir, "input directory")?;
        files::ensure_dir(&self.output_dir, "output directory")
    }
}

/// Convert every image directly inside `options.input_dir`.
///
/// Files are visited in file name order. A file that fails to load or save
/// is recorded in the report and does not stop the batch. When two sources
/// share a stem (`a.bmp`, `a.png`) only the first one is converted.
pub fn convert_dir(options: &ColorKeyOptions) -> Result<BatchReport> {
    options.validate()?;
    let sources = files::list_files(&options.input_dir, files::is_image_file)?;

    let mut report = BatchReport::default();
    let mut claims = OutputClaims::default();
    for source in &sources {
        let outcome = files::output_path(&options.output_dir, source, "png")
            .and_then(|output| claims.claim(output, source))
            .and_then(|()| convert_file(source, &options.output_dir))
            .map(|output| vec![output]);
        report.record(source, outcome);
    }
    info!(
        "Color key finished: {} converted, {} failed",
        report.processed,
        report.failures.len()
    );
    Ok(report)
}
