//! Keypoint sidecar format: one annotation per line.
//!
//! ```text
//! <class> <x_c> <y_c> <w> <h> (<kx> <ky> <kv>){9}
//! ```
//!
//! All floats are normalized to the image dimensions. Loading is tolerant
//! (malformed lines are skipped with a diagnostic, short keypoint lists are
//! zero-padded, extra triples are dropped); saving always writes exactly
//! nine triples per annotation.

use std::path::Path;

use crate::format::error::LabelError;
use crate::format::report::ParseReport;
use crate::model::{Annotation, BoundingBox, Keypoint, Visibility, KEYPOINT_COUNT};

/// Load annotations from a sidecar file.
///
/// A missing file is an empty annotation list, not an error. Problem lines
/// are skipped (or repaired) and reported; the rest of the file still loads.
pub fn load(path: &Path) -> Result<(Vec<Annotation>, ParseReport), LabelError> {
    let mut report = ParseReport::new();
    if !path.exists() {
        return Ok((Vec::new(), report));
    }

    let content = std::fs::read_to_string(path)?;
    let mut annotations = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((annotation, repairs)) => {
                for message in repairs {
                    report.push(line_no, message);
                }
                annotations.push(annotation);
            }
            Err(message) => report.push(line_no, message),
        }
    }

    log::info!(
        "loaded {} annotations from {:?} ({} diagnostics)",
        annotations.len(),
        path,
        report.diagnostics().len()
    );
    Ok((annotations, report))
}

/// Save annotations to a sidecar file, fully replacing its contents.
pub fn save(path: &Path, annotations: &[Annotation]) -> Result<(), LabelError> {
    let mut out = String::new();
    for ann in annotations {
        let b = &ann.bbox;
        let mut fields = vec![
            ann.class_id.to_string(),
            b.x_center.to_string(),
            b.y_center.to_string(),
            b.width.to_string(),
            b.height.to_string(),
        ];
        for kp in &ann.keypoints {
            fields.push(kp.x.to_string());
            fields.push(kp.y.to_string());
            fields.push(kp.visibility.as_u8().to_string());
        }
        out.push_str(&fields.join(" "));
        out.push('\n');
    }
    std::fs::write(path, out)?;
    log::info!("saved {} annotations to {:?}", annotations.len(), path);
    Ok(())
}

/// Parse one line. On success also returns repair notes for keypoint triples
/// that were coerced to absent. A malformed class id, bbox value or
/// non-numeric keypoint token fails the whole line.
fn parse_line(line: &str) -> Result<(Annotation, Vec<String>), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(format!("expected at least 5 fields, got {}", parts.len()));
    }

    let class_id: usize = parts[0]
        .parse()
        .map_err(|_| format!("invalid class id '{}'", parts[0]))?;

    let mut bbox = [0f32; 4];
    for (i, token) in parts[1..5].iter().enumerate() {
        let value: f32 = token
            .parse()
            .map_err(|_| format!("invalid bbox value '{}'", token))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("bbox value {} outside [0, 1]", value));
        }
        bbox[i] = value;
    }

    let mut annotation = Annotation::new(
        class_id,
        BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
    );
    let mut repairs = Vec::new();

    // Keypoint triples start at token 5. Missing trailing triples stay at
    // the default (0, 0, absent); tokens past the ninth triple are ignored.
    for slot in 0..KEYPOINT_COUNT {
        let base = 5 + slot * 3;
        if base + 3 > parts.len() {
            break;
        }
        let x: f32 = parts[base]
            .parse()
            .map_err(|_| format!("invalid keypoint value '{}'", parts[base]))?;
        let y: f32 = parts[base + 1]
            .parse()
            .map_err(|_| format!("invalid keypoint value '{}'", parts[base + 1]))?;
        let v: u8 = parts[base + 2]
            .parse()
            .map_err(|_| format!("invalid visibility flag '{}'", parts[base + 2]))?;

        let in_range = (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y);
        match Visibility::from_u8(v) {
            Some(visibility) if in_range => {
                annotation.keypoints[slot] = Keypoint::new(x, y, visibility);
            }
            _ => {
                // Out-of-range triples are cleared rather than failing the line.
                repairs.push(format!(
                    "keypoint {} out of range ({} {} {}), cleared",
                    slot + 1,
                    x,
                    y,
                    v
                ));
            }
        }
    }

    Ok((annotation, repairs))
}
