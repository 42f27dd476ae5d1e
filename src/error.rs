use image::ImageError;
use std::{
    error::Error,
    fmt, io,
    path::{Path, PathBuf},
};

/// Broad classification of an [AssetError].
///
/// Batch drivers use this to decide what to do with a failure:
/// configuration errors stop the run before any file is touched, everything
/// else is reported and the batch moves on to the next file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file could not be read or written.
    Io,
    /// A file was readable but its content is not a valid image or table.
    Format,
    /// Paths or parameters given to a utility are invalid.
    Configuration,
    /// Two sources in one batch would write the same output.
    Conflict,
}

/// An error occured while converting assets.
#[derive(Debug)]
pub enum AssetError {
    /// Options are invalid. String contains detailed message.
    InvalidConfig(String),
    /// An IO error occured while accessing `path`.
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        #[allow(missing_docs)]
        source: io::Error,
    },
    /// The image at `path` could not be decoded or encoded.
    Image {
        /// Source or destination image.
        path: PathBuf,
        #[allow(missing_docs)]
        source: ImageError,
    },
    /// The workbook at `path` could not be read.
    Workbook {
        /// Source workbook.
        path: PathBuf,
        /// Message reported by the workbook reader.
        message: String,
    },
    /// The JSON output for `path` could not be produced.
    Json {
        /// Destination file.
        path: PathBuf,
        #[allow(missing_docs)]
        source: serde_json::Error,
    },
    /// `path` would be written again; an earlier source of the batch,
    /// `claimed_by`, already produced it.
    OutputConflict {
        /// Output that both sources map to.
        path: PathBuf,
        /// Source that was processed first and keeps the output.
        claimed_by: PathBuf,
    },
}

impl AssetError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        AssetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn image(path: &Path, source: ImageError) -> Self {
        AssetError::Image {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::InvalidConfig(_) => ErrorKind::Configuration,
            AssetError::Io { .. } => ErrorKind::Io,
            AssetError::Image {
                source: ImageError::IoError(_),
                ..
            } => ErrorKind::Io,
            AssetError::Image { .. } | AssetError::Workbook { .. } => ErrorKind::Format,
            AssetError::Json { source, .. } => {
                if source.is_io() {
                    ErrorKind::Io
                } else {
                    ErrorKind::Format
                }
            }
            AssetError::OutputConflict { .. } => ErrorKind::Conflict,
        }
    }

    /// The file or directory this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            AssetError::InvalidConfig(_) => None,
            AssetError::Io { path, .. }
            | AssetError::Image { path, .. }
            | AssetError::Workbook { path, .. }
            | AssetError::Json { path, .. }
            | AssetError::OutputConflict { path, .. } => Some(path),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            AssetError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            AssetError::Image { path, source } => {
                write!(f, "Image error in {}: {}", path.display(), source)
            }
            AssetError::Workbook { path, message } => {
                write!(f, "Workbook error in {}: {}", path.display(), message)
            }
            AssetError::Json { path, source } => {
                write!(f, "JSON error for {}: {}", path.display(), source)
            }
            AssetError::OutputConflict { path, claimed_by } => write!(
                f,
                "Output {} was already written for {}",
                path.display(),
                claimed_by.display()
            ),
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            AssetError::Image { source, .. } => Some(source),
            AssetError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
