//! Sidecar label file I/O.
//!
//! Each image owns a text file with the same base name and a `.txt`
//! extension. The keypoint labeler rewrites its sidecar wholesale on save;
//! the contour labeler appends one line per completed stroke. Loading is
//! tolerant: malformed lines are skipped with diagnostics collected into a
//! [`ParseReport`] instead of failing the file.

pub mod contour;
mod error;
pub mod keypoint;
mod report;

pub use error::LabelError;
pub use report::{LineDiagnostic, ParseReport};
