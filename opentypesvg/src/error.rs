//! Errors reported by the tools

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}: {inner}")]
    Io {
        path: PathBuf,
        #[source]
        inner: std::io::Error,
    },

    #[error("{0} is not a valid font file path.")]
    InvalidFontPath(PathBuf),

    #[error("{0} is not a valid folder path.")]
    InvalidFolderPath(PathBuf),

    #[error("Unsupported font container: {0}")]
    UnsupportedContainer(&'static str),

    #[error("Malformed {flavor} data: {reason}")]
    MalformedContainer {
        flavor: &'static str,
        reason: String,
    },

    #[error("No SVG files were found.")]
    NoSvgFiles,

    #[error("No valid font files were provided.")]
    NoFonts,

    #[error("The font does not have the SVG table.")]
    MissingSvgTable,

    #[error("The SVG table has no data that can be output.")]
    EmptySvgTable,

    #[error("Error reading font data: {0}")]
    Read(String),

    #[error("Error building font: {0}")]
    Build(String),

    #[error("{0} is not a valid hex color.")]
    InvalidColor(String),

    #[error(transparent)]
    Table(#[from] svg_table::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, inner: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            inner,
        }
    }

    pub(crate) fn read(err: impl std::fmt::Display) -> Self {
        Error::Read(err.to_string())
    }

    pub(crate) fn malformed(flavor: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedContainer {
            flavor,
            reason: reason.into(),
        }
    }
}
