//! Slice sprite sheets into fixed-size tiles.
//!
//! A sheet of `W x H` pixels split into tiles of `Tw x Th` produces
//! `ceil(W / Tw) * ceil(H / Th)` tiles. The grid starts at `(0, 0)` and tiles
//! are numbered from zero in row-major order (left to right, then top to
//! bottom). What happens to the last column and row when the sheet is not
//! an exact multiple of the tile size is chosen with an [EdgePolicy].

use crate::{
    color_key::TRANSPARENT,
    files::{self, BatchReport, OutputClaims},
    AssetError, Result,
};
use std::convert::TryFrom;
use image::{imageops, ImageFormat, RgbaImage};
use log::{debug, info};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Width and height of a tile in pixels. Both are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSize {
    width: u32,
    height: u32,
}

impl TileSize {
    /// Create a tile size. Fails if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidConfig(format!(
                "tile size must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(TileSize { width, height })
    }

    /// Tile width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tile height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for TileSize {
    fn default() -> Self {
        TileSize {
            width: 160,
            height: 160,
        }
    }
}

/// How to treat tiles in the last column or row that extend past the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Emit the tile cut down to the part that lies inside the image.
    Clip,
    /// Emit a full-size tile. The part outside the image is transparent.
    Pad,
    /// Do not emit partial tiles at all.
    Drop,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        EdgePolicy::Clip
    }
}

/// Location of a single tile inside its source image.
///
/// `width` and `height` are already clipped to the image bound, so they are
/// smaller than the tile size for the last column and row of an image whose
/// size is not a multiple of the tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Zero-based position in row-major order.
    pub index: u64,
    #[allow(missing_docs)]
    pub column: u32,
    #[allow(missing_docs)]
    pub row: u32,
    #[allow(missing_docs)]
    pub left: u32,
    #[allow(missing_docs)]
    pub top: u32,
    #[allow(missing_docs)]
    pub width: u32,
    #[allow(missing_docs)]
    pub height: u32,
}

impl TileRect {
    /// Does this rect cover a full tile of `size`?
    pub fn is_full(&self, size: TileSize) -> bool {
        self.width == size.width && self.height == size.height
    }
}

/// The tile layout of an image.
#[derive(Debug, Clone, Copy)]
pub struct TileGrid {
    image_width: u32,
    image_height: u32,
    size: TileSize,
}

impl TileGrid {
    /// Layout for an image of `image_width x image_height` pixels.
    pub fn new(image_width: u32, image_height: u32, size: TileSize) -> Self {
        TileGrid {
            image_width,
            image_height,
            size,
        }
    }

    /// Number of tiles per row.
    pub fn columns(&self) -> u32 {
        div_ceil(self.image_width, self.size.width)
    }

    /// Number of tile rows.
    pub fn rows(&self) -> u32 {
        div_ceil(self.image_height, self.size.height)
    }

    /// Total number of tiles, including partial ones.
    ///
    /// Counted in `u64`: a 100000x100000 image cut into 1x1 tiles has more
    /// tiles than fit in a `u32`.
    pub fn len(&self) -> u64 {
        u64::from(self.columns()) * u64::from(self.rows())
    }

    /// `true` for an image with zero width or height.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Geometry of the tile at `index`, or `None` if out of range.
    pub fn rect(&self, index: u64) -> Option<TileRect> {
        if index >= self.len() {
            return None;
        }
        let columns = u64::from(self.columns());
        // Both fit in u32: column < columns and row < rows.
        let column = (index % columns) as u32;
        let row = (index / columns) as u32;
        let left = column * self.size.width;
        let top = row * self.size.height;
        Some(TileRect {
            index,
            column,
            row,
            left,
            top,
            width: self.size.width.min(self.image_width - left),
            height: self.size.height.min(self.image_height - top),
        })
    }

    /// Iterate over all tiles in row-major order.
    pub fn iter(&self) -> TileIter {
        TileIter {
            grid: *self,
            next: 0,
        }
    }
}

/// An iterator over the tiles of a [TileGrid].
#[derive(Debug)]
pub struct TileIter {
    grid: TileGrid,
    next: u64,
}

impl Iterator for TileIter {
    type Item = TileRect;

    fn next(&mut self) -> Option<Self::Item> {
        let rect = self.grid.rect(self.next)?;
        self.next += 1;
        Some(rect)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len() - self.next.min(self.grid.len());
        match usize::try_from(remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl ExactSizeIterator for TileIter {}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    value / divisor + u32::from(value % divisor != 0)
}

/// A tile cut out of a source image.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Where the tile came from. With [EdgePolicy::Drop] `rect.index` is
    /// still the position in the full grid; use [Tile::index] for naming.
    pub rect: TileRect,
    /// Sequential number among the emitted tiles.
    pub index: u64,
    /// Pixel data. Independent from the source image.
    pub image: RgbaImage,
}

/// Cut `image` into tiles of `size`.
///
/// Tiles are returned in row-major order.
pub fn split_image(image: &RgbaImage, size: TileSize, policy: EdgePolicy) -> Vec<Tile> {
    let (width, height) = image.dimensions();
    let mut tiles = Vec::new();
    for rect in TileGrid::new(width, height, size).iter() {
        let full = rect.is_full(size);
        if !full && policy == EdgePolicy::Drop {
            continue;
        }
        let clipped = imageops::crop_imm(image, rect.left, rect.top, rect.width, rect.height)
            .to_image();
        let tile_image = if !full && policy == EdgePolicy::Pad {
            let mut padded = RgbaImage::from_pixel(size.width, size.height, TRANSPARENT);
            imageops::replace(&mut padded, &clipped, 0, 0);
            padded
        } else {
            clipped
        };
        tiles.push(Tile {
            rect,
            index: tiles.len() as u64,
            image: tile_image,
        });
    }
    tiles
}

/// File name of tile `index` cut from an image with file stem `stem`.
pub fn tile_file_name(stem: &str, index: u64) -> String {
    format!("{}_tile_{}.png", stem, index)
}

/// Does the name of `path` follow the [tile_file_name] scheme?
///
/// Returns `<dir>/<stem>` of the image the tile would have been cut from.
/// A match only says the name fits; `grass_tile_1.png` may just as well be a
/// hand-made sheet.
pub fn tile_source_stem(path: &Path) -> Option<PathBuf> {
    if !files::has_extension(path, &["png"]) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (base, index) = stem.rsplit_once("_tile_")?;
    if base.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(path.with_file_name(base))
}

/// Is `path` named like a tile output? See [tile_source_stem].
pub fn is_tile_output(path: &Path) -> bool {
    tile_source_stem(path).is_some()
}

/// Split the image at `path` and write its tiles as PNG into `output_dir`.
///
/// Returns the written paths in tile order.
pub fn split_file(
    path: &Path,
    size: TileSize,
    policy: EdgePolicy,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let image = image::open(path)
        .map_err(|err| AssetError::image(path, err))?
        .into_rgba8();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tiles = split_image(&image, size, policy);
    let mut outputs = Vec::with_capacity(tiles.len());
    for tile in &tiles {
        let output = output_dir.join(tile_file_name(&stem, tile.index));
        tile.image
            .save_with_format(&output, ImageFormat::Png)
            .map_err(|err| AssetError::image(&output, err))?;
        outputs.push(output);
    }
    info!(
        "Split {} ({}x{}) into {} tiles",
        path.display(),
        image.width(),
        image.height(),
        outputs.len()
    );
    Ok(outputs)
}

/// Configuration of [split_tree].
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Root of the directory tree to process.
    pub input_dir: PathBuf,
    #[allow(missing_docs)]
    pub tile_size: TileSize,
    #[allow(missing_docs)]
    pub edge_policy: EdgePolicy,
}

impl SplitOptions {
    /// Check that the input directory exists.
    pub fn validate(&self) -> Result<()> {
        files::require_dir(&self.input_dir, "input directory")
    }
}

/// Split every image below `options.input_dir`.
///
/// Tiles are written next to their source image. A file named like a tile
/// (`<x>_tile_<n>.png`) is skipped only when an image with stem `<x>` sits in
/// the same directory; otherwise it is an ordinary sheet and gets split. The
/// full file list is collected before the first tile is written, so running
/// this twice gives the same result as running it once.
///
/// Images in one directory that share a stem (`a.png`, `a.bmp`) would write
/// the same tiles; only the first one is split, the others are reported as
/// conflicts.
pub fn split_tree(options: &SplitOptions) -> Result<BatchReport> {
    options.validate()?;
    let mut report = BatchReport::default();
    let candidates = files::walk_files(&options.input_dir, files::is_image_file, &mut report);
    let stems: HashSet<PathBuf> = candidates.iter().map(|p| p.with_extension("")).collect();

    let mut claims = OutputClaims::default();
    for source in &candidates {
        if let Some(origin) = tile_source_stem(source) {
            if stems.contains(&origin) {
                debug!("Skipping tile output {}", source.display());
                continue;
            }
        }
        let output_dir = source.parent().unwrap_or(&options.input_dir);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = claims
            .claim(output_dir.join(tile_file_name(&stem, 0)), source)
            .and_then(|()| {
                split_file(source, options.tile_size, options.edge_policy, output_dir)
            });
        report.record(source, outcome);
    }
    info!(
        "Tiling finished: {} images split into {} tiles, {} failed",
        report.processed,
        report.outputs.len(),
        report.failures.len()
    );
    Ok(report)
}
