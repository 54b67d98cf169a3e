//! Contour sidecar format: one completed stroke per line, append-only.
//!
//! ```text
//! <class> (<x> <y>)+
//! ```
//!
//! Coordinates are normalized to the image dimensions with six decimal
//! places. The file is truncated when an image is loaded and on explicit
//! reset; during a session every completed stroke appends one line.

use std::io::Write;
use std::path::Path;

use crate::format::error::LabelError;

/// Truncate the sidecar to empty (image load / explicit reset).
pub fn truncate(path: &Path) -> Result<(), LabelError> {
    std::fs::File::create(path)?;
    Ok(())
}

/// Append one completed stroke. Points are image-pixel coordinates and get
/// normalized against the given image size.
pub fn append_stroke(
    path: &Path,
    class_id: usize,
    points: &[(f32, f32)],
    image_w: f32,
    image_h: f32,
) -> Result<(), LabelError> {
    let mut line = class_id.to_string();
    for (x, y) in points {
        line.push_str(&format!(" {:.6} {:.6}", x / image_w, y / image_h));
    }
    line.push('\n');

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line.as_bytes())?;
    log::debug!("appended {}-point stroke to {:?}", points.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strokes_append_one_line_each() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.txt");

        truncate(&path).unwrap();
        append_stroke(&path, 0, &[(10.0, 20.0), (30.0, 40.0)], 100.0, 100.0).unwrap();
        append_stroke(&path, 3, &[(50.0, 50.0)], 100.0, 100.0).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0 0.100000 0.200000 0.300000 0.400000");
        assert_eq!(lines[1], "3 0.500000 0.500000");
    }

    #[test]
    fn test_truncate_discards_previous_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.txt");

        append_stroke(&path, 0, &[(10.0, 10.0)], 100.0, 100.0).unwrap();
        truncate(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.is_empty());
    }
}
