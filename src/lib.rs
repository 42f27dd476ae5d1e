#![warn(clippy::all)]
#![warn(missing_docs)]
/*!

Small utilities for preparing game assets. Each utility is a single-pass,
single-threaded batch over a directory listing:

- [color_key] turns bitmaps into PNGs where the key green `(0, 255, 0)`
  becomes fully transparent.
- [tiles] slices sprite sheets into fixed-size tiles written next to the
  source image.
- [table] converts `.xlsx` configuration tables into JSON arrays of row
  objects.

All image work happens on `image::RgbaImage` from the
[image](https://docs.rs/image) library, so you can also use the per-image
functions in your own pipeline.

# Basic Usage

## Color key a folder of bitmaps

```no_run
use assetkit::color_key::{convert_dir, ColorKeyOptions};
# use std::path::PathBuf;

let options = ColorKeyOptions {
    input_dir: PathBuf::from("raw/bmp"),
    output_dir: PathBuf::from("raw/png"),
};
let report = convert_dir(&options).unwrap();
println!("Converted {} files", report.outputs.len());
```

## Split sprite sheets

```no_run
use assetkit::tiles::{split_tree, EdgePolicy, SplitOptions, TileSize};
# use std::path::PathBuf;

let options = SplitOptions {
    input_dir: PathBuf::from("raw/png/knife"),
    tile_size: TileSize::new(160, 160).unwrap(),
    edge_policy: EdgePolicy::Clip,
};
let report = split_tree(&options).unwrap();
assert!(report.is_success());
```

Tiles are named `<stem>_tile_<index>.png` and numbered in row-major order.

## Export tables

```no_run
use assetkit::table::{export_dir, ExportOptions};
# use std::path::PathBuf;

let options = ExportOptions {
    input_dir: PathBuf::from("assets/config"),
    output_dir: PathBuf::from("assets/resources/config"),
    split_lines: true,
    array_marker: None,
};
export_dir(&options).unwrap();
```

*/

pub mod color_key;
pub(crate) mod error;
pub mod files;
pub mod table;
pub mod tiles;

/// A specialized `Result` type for the asset utilities.
pub type Result<T> = std::result::Result<T, AssetError>;

pub use error::{AssetError, ErrorKind};
pub use files::BatchReport;
