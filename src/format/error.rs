//! Error types for label file and image operations.

use thiserror::Error;

/// Errors that can occur loading images or reading/writing label files.
///
/// Per-line problems in a label file are not errors; they are collected as
/// diagnostics in a [`crate::format::ParseReport`].
#[derive(Error, Debug)]
pub enum LabelError {
    /// I/O failure on a label file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
