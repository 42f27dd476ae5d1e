//
// Command line front end for the asset utilities.
//
// Logging goes through env_logger; set RUST_LOG=debug to see skipped files.
//
use anyhow::{bail, Result};
use assetkit::{
    color_key::{self, ColorKeyOptions},
    table::{self, ExportOptions},
    tiles::{self, EdgePolicy, SplitOptions, TileSize},
    BatchReport,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Prepare game assets")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images to PNG, turning pure green (0, 255, 0) transparent
    ColorKey {
        /// Directory with the source images
        input: PathBuf,
        /// Directory for the PNG files (created if missing)
        output: PathBuf,
    },
    /// Split every image in a directory tree into fixed-size tiles
    Split {
        /// Root directory; tiles are written next to each image
        input: PathBuf,
        /// Tile width in pixels
        #[arg(long, default_value_t = 160)]
        tile_width: u32,
        /// Tile height in pixels
        #[arg(long, default_value_t = 160)]
        tile_height: u32,
        /// What to do with tiles that extend past the image
        #[arg(long, value_enum, default_value_t = Edge::Clip)]
        edge: Edge,
    },
    /// Export .xlsx tables as JSON arrays of row objects
    Export {
        /// Directory with the workbooks
        input: PathBuf,
        /// Directory for the JSON files (created if missing)
        output: PathBuf,
        /// Split cells containing line breaks into string lists
        #[arg(long, default_value_t = false)]
        split_lines: bool,
        /// Columns whose name contains this text always become lists
        #[arg(long)]
        array_marker: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Edge {
    Clip,
    Pad,
    Drop,
}

impl From<Edge> for EdgePolicy {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Clip => EdgePolicy::Clip,
            Edge::Pad => EdgePolicy::Pad,
            Edge::Drop => EdgePolicy::Drop,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let report = match args.command {
        Command::ColorKey { input, output } => color_key::convert_dir(&ColorKeyOptions {
            input_dir: input,
            output_dir: output,
        })?,
        Command::Split {
            input,
            tile_width,
            tile_height,
            edge,
        } => tiles::split_tree(&SplitOptions {
            input_dir: input,
            tile_size: TileSize::new(tile_width, tile_height)?,
            edge_policy: edge.into(),
        })?,
        Command::Export {
            input,
            output,
            split_lines,
            array_marker,
        } => table::export_dir(&ExportOptions {
            input_dir: input,
            output_dir: output,
            split_lines,
            array_marker,
        })?,
    };

    summarize(&report)
}

fn summarize(report: &BatchReport) -> Result<()> {
    println!(
        "{} files processed, {} outputs written, {} failed",
        report.processed,
        report.outputs.len(),
        report.failures.len()
    );
    for (path, err) in &report.failures {
        eprintln!("  {}: {}", path.display(), err);
    }
    if !report.is_success() {
        bail!("{} files failed", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn every_argument_has_help() {
        let mut cmd = Args::command();
        cmd.build();
        for sub in cmd.get_subcommands().filter(|sub| sub.get_name() != "help") {
            for arg in sub.get_arguments() {
                if arg.get_id() == "help" {
                    continue;
                }
                assert!(
                    arg.get_help().is_some(),
                    "{} --{} has no help text",
                    sub.get_name(),
                    arg.get_id()
                );
            }
        }
    }

    #[test]
    fn split_defaults_to_160_clip() {
        let args = Args::try_parse_from(["assetkit", "split", "sheets"]).unwrap();
        match args.command {
            Command::Split {
                tile_width,
                tile_height,
                edge,
                ..
            } => {
                assert_eq!((tile_width, tile_height), (160, 160));
                assert_eq!(EdgePolicy::from(edge), EdgePolicy::Clip);
            }
            _ => panic!("expected split"),
        }
    }
}
