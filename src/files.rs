//! Directory listing, output naming, and batch bookkeeping shared by all
//! utilities.
//!
//! Listings are always sorted by file name so that repeated runs visit files
//! (and therefore number their outputs) in the same order regardless of the
//! platform.

use crate::{AssetError, Result};
use log::{debug, warn};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Lower case extensions of the image formats that can be decoded.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Does `path` have an extension in `allowed`? Comparison ignores case.
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Does `path` look like a decodable image file?
pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Build `<dir>/<stem of input>.<extension>`.
pub fn output_path(dir: &Path, input: &Path, extension: &str) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        AssetError::io(
            input,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    // Not `set_extension`: it would eat the `.b` of a stem like `a.b`.
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    Ok(dir.join(name))
}

/// Fail with a configuration error unless `dir` is an existing directory.
pub fn require_dir(dir: &Path, what: &str) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else if dir.exists() {
        Err(AssetError::InvalidConfig(format!(
            "{} is not a directory: {}",
            what,
            dir.display()
        )))
    } else {
        Err(AssetError::InvalidConfig(format!(
            "{} does not exist: {}",
            what,
            dir.display()
        )))
    }
}

/// Create `dir` (and its parents) unless it already exists.
pub fn ensure_dir(dir: &Path, what: &str) -> Result<()> {
    if dir.exists() {
        return require_dir(dir, what);
    }
    std::fs::create_dir_all(dir).map_err(|err| {
        AssetError::InvalidConfig(format!(
            "could not create {} {}: {}",
            what,
            dir.display(),
            err
        ))
    })
}

/// All regular files directly inside `dir` for which `keep` returns `true`,
/// sorted by file name.
pub fn list_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let entries = std::fs::read_dir(dir).map_err(|err| AssetError::io(dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| AssetError::io(dir, err))?.path();
        if !path.is_file() {
            continue;
        }
        if keep(&path) {
            files.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// All regular files below `root` (recursively) for which `keep` returns
/// `true`, in sorted depth-first order.
///
/// Entries that cannot be read are recorded as failures in `report` and the
/// walk continues with the next entry.
pub fn walk_files<F>(root: &Path, keep: F, report: &mut BatchReport) -> Vec<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                if keep(entry.path()) {
                    files.push(entry.into_path());
                } else {
                    debug!("Skipping {}", entry.path().display());
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let source = err.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "file system loop detected")
                });
                report.fail(path.clone(), AssetError::io(&path, source));
            }
        }
    }
    files
}

/// Outputs already claimed by a source earlier in the batch.
///
/// Sources that differ only in extension (`a.bmp`, `a.png`) map to the same
/// output; the first one in listing order keeps it and later ones fail with
/// [AssetError::OutputConflict].
#[derive(Debug, Default)]
pub struct OutputClaims {
    claimed: HashMap<PathBuf, PathBuf>,
}

impl OutputClaims {
    /// Reserve `output` for `source`.
    pub fn claim(&mut self, output: PathBuf, source: &Path) -> Result<()> {
        if let Some(first) = self.claimed.get(&output) {
            return Err(AssetError::OutputConflict {
                path: output,
                claimed_by: first.clone(),
            });
        }
        let _ = self.claimed.insert(output, source.to_path_buf());
        Ok(())
    }
}

/// Outcome of a batch run.
///
/// A batch never stops at the first bad file: the failure is stored here and
/// processing continues.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of source files that were processed successfully.
    pub processed: usize,
    /// Every file written, in the order they were written.
    pub outputs: Vec<PathBuf>,
    /// Source files that failed, with the reason.
    pub failures: Vec<(PathBuf, AssetError)>,
}

impl BatchReport {
    /// `true` if no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold the outcome of processing `source` into the report.
    pub fn record(&mut self, source: &Path, outcome: Result<Vec<PathBuf>>) {
        match outcome {
            Ok(outputs) => {
                self.processed += 1;
                self.outputs.extend(outputs);
            }
            Err(err) => self.fail(source.to_path_buf(), err),
        }
    }

    pub(crate) fn fail(&mut self, source: PathBuf, err: AssetError) {
        warn!("Skipping {}: {}", source.display(), err);
        self.failures.push((source, err));
    }
}
