//! Freehand contour labeler.
//!
//! Captures one stroke per left-button drag and appends it to the sidecar as
//! a line of normalized points when the button is released. The sidecar is
//! truncated when an image is loaded and on explicit reset; the raster
//! overlay painting itself belongs to the display layer.

use std::path::{Path, PathBuf};

use crate::config::LabelerConfig;
use crate::event::{InputEvent, MouseButton};
use crate::format::{contour as contour_format, LabelError, ParseReport};
use crate::keybindings::Action;
use crate::mapper::DisplayMapper;
use crate::tool::{LabelTool, ToolEvent};

/// The contour labeling tool.
pub struct ContourTool {
    config: LabelerConfig,
    current_class: usize,
    label_path: Option<PathBuf>,
    /// In-progress stroke in image-pixel coordinates.
    stroke: Vec<(f32, f32)>,
    drawing: bool,
}

impl ContourTool {
    pub fn new(config: LabelerConfig) -> Self {
        Self {
            config,
            current_class: 0,
            label_path: None,
            stroke: Vec::new(),
            drawing: false,
        }
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn current_class(&self) -> usize {
        self.current_class
    }

    /// Overlay color for the currently selected class.
    pub fn current_color(&self) -> [u8; 3] {
        self.config.class_color(self.current_class)
    }

    /// Change the class tagged onto subsequent strokes.
    pub fn set_current_class(&mut self, class_id: usize) -> bool {
        if class_id < self.config.class_count() {
            self.current_class = class_id;
            true
        } else {
            false
        }
    }

    /// The stroke currently being drawn (image pixels).
    pub fn in_progress(&self) -> &[(f32, f32)] {
        &self.stroke
    }

    /// Discard all strokes of the current image: truncate the sidecar and
    /// drop any in-progress stroke. The display layer repaints from the
    /// clean image.
    pub fn reset(&mut self) -> Result<(), LabelError> {
        if let Some(path) = &self.label_path {
            contour_format::truncate(path)?;
        }
        self.stroke.clear();
        self.drawing = false;
        Ok(())
    }

    fn commit_stroke(&mut self, mapper: &DisplayMapper) -> Vec<ToolEvent> {
        self.drawing = false;
        if self.stroke.is_empty() {
            return Vec::new();
        }
        let Some(path) = self.label_path.clone() else {
            self.stroke.clear();
            return Vec::new();
        };

        let (image_w, image_h) = mapper.image_size();
        let points = std::mem::take(&mut self.stroke);
        match contour_format::append_stroke(&path, self.current_class, &points, image_w, image_h) {
            Ok(()) => vec![ToolEvent::StrokeCommitted {
                class_id: self.current_class,
                points: points.len(),
            }],
            Err(e) => vec![ToolEvent::IoFailed {
                message: format!("Failed to write stroke: {}", e),
            }],
        }
    }
}

impl LabelTool for ContourTool {
    fn begin_image(&mut self, label_path: &Path) -> Result<ParseReport, LabelError> {
        self.stroke.clear();
        self.drawing = false;
        self.label_path = Some(label_path.to_path_buf());
        // Strokes from a previous session are discarded, not resumed.
        contour_format::truncate(label_path)?;
        Ok(ParseReport::new())
    }

    fn flush(&mut self, _label_path: &Path) -> Result<(), LabelError> {
        // Strokes are appended as they complete; nothing is buffered.
        Ok(())
    }

    fn handle_mouse(&mut self, event: &InputEvent, mapper: &DisplayMapper) -> Vec<ToolEvent> {
        match event {
            InputEvent::MousePressed {
                button: MouseButton::Left,
                pos,
            } => {
                if let Some(point) = mapper.to_image(pos.x, pos.y) {
                    self.drawing = true;
                    self.stroke = vec![point];
                }
                Vec::new()
            }
            InputEvent::MouseMoved { pos } => {
                if self.drawing {
                    // Points dragged outside the image are dropped.
                    if let Some(point) = mapper.to_image(pos.x, pos.y) {
                        self.stroke.push(point);
                    }
                }
                Vec::new()
            }
            InputEvent::MouseReleased {
                button: MouseButton::Left,
                ..
            } => {
                if self.drawing {
                    self.commit_stroke(mapper)
                } else {
                    Vec::new()
                }
            }
            InputEvent::MousePressed {
                button: MouseButton::Right,
                ..
            } => {
                if self.drawing {
                    self.drawing = false;
                    self.stroke.clear();
                    vec![ToolEvent::Cancelled]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn apply_action(&mut self, action: Action) -> Vec<ToolEvent> {
        match action {
            Action::SelectClass(class_id) => {
                self.set_current_class(class_id);
                Vec::new()
            }
            Action::Cancel => {
                if self.drawing {
                    self.drawing = false;
                    self.stroke.clear();
                    vec![ToolEvent::Cancelled]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.stroke.clear();
        self.drawing = false;
        self.label_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Point;
    use tempfile::TempDir;

    fn tool() -> ContourTool {
        ContourTool::new(LabelerConfig::contour_defaults())
    }

    fn mapper() -> DisplayMapper {
        DisplayMapper::new(100.0, 100.0, 100, 100)
    }

    fn press(tool: &mut ContourTool, x: f32, y: f32) -> Vec<ToolEvent> {
        tool.handle_mouse(
            &InputEvent::MousePressed {
                button: MouseButton::Left,
                pos: Point::new(x, y),
            },
            &mapper(),
        )
    }

    fn drag(tool: &mut ContourTool, x: f32, y: f32) -> Vec<ToolEvent> {
        tool.handle_mouse(&InputEvent::MouseMoved { pos: Point::new(x, y) }, &mapper())
    }

    fn release(tool: &mut ContourTool, x: f32, y: f32) -> Vec<ToolEvent> {
        tool.handle_mouse(
            &InputEvent::MouseReleased {
                button: MouseButton::Left,
                pos: Point::new(x, y),
            },
            &mapper(),
        )
    }

    #[test]
    fn test_stroke_appends_on_release() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();

        press(&mut tool, 10.0, 10.0);
        drag(&mut tool, 20.0, 20.0);
        drag(&mut tool, 30.0, 30.0);
        let events = release(&mut tool, 30.0, 30.0);
        assert_eq!(
            events,
            vec![ToolEvent::StrokeCommitted {
                class_id: 0,
                points: 3
            }]
        );

        let content = std::fs::read_to_string(&label).unwrap();
        assert_eq!(
            content.trim_end(),
            "0 0.100000 0.100000 0.200000 0.200000 0.300000 0.300000"
        );
    }

    #[test]
    fn test_class_tag_prefixes_line() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();
        tool.apply_action(Action::SelectClass(4));
        assert_eq!(tool.current_class(), 4);
        assert_eq!(tool.current_color(), [255, 255, 0]);

        press(&mut tool, 50.0, 50.0);
        release(&mut tool, 50.0, 50.0);

        let content = std::fs::read_to_string(&label).unwrap();
        assert!(content.starts_with("4 "));
    }

    #[test]
    fn test_points_outside_image_dropped() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();

        press(&mut tool, 90.0, 90.0);
        drag(&mut tool, 150.0, 150.0); // off the image
        drag(&mut tool, 95.0, 95.0);
        let events = release(&mut tool, 95.0, 95.0);
        assert_eq!(
            events,
            vec![ToolEvent::StrokeCommitted {
                class_id: 0,
                points: 2
            }]
        );
    }

    #[test]
    fn test_press_outside_image_does_not_start_stroke() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();

        press(&mut tool, 150.0, 150.0);
        let events = release(&mut tool, 150.0, 150.0);
        assert!(events.is_empty());
        assert_eq!(std::fs::read_to_string(&label).unwrap(), "");
    }

    #[test]
    fn test_begin_image_truncates_previous_session() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        std::fs::write(&label, "0 0.5 0.5\n").unwrap();

        let mut tool = tool();
        tool.begin_image(&label).unwrap();
        assert_eq!(std::fs::read_to_string(&label).unwrap(), "");
    }

    #[test]
    fn test_reset_truncates_and_drops_stroke() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();

        press(&mut tool, 10.0, 10.0);
        release(&mut tool, 10.0, 10.0);
        press(&mut tool, 20.0, 20.0);
        tool.reset().unwrap();

        assert_eq!(std::fs::read_to_string(&label).unwrap(), "");
        assert!(tool.in_progress().is_empty());

        // Strokes after a reset append to the now-empty file.
        press(&mut tool, 30.0, 30.0);
        release(&mut tool, 30.0, 30.0);
        let content = std::fs::read_to_string(&label).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_right_click_discards_stroke() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("frame.txt");
        let mut tool = tool();
        tool.begin_image(&label).unwrap();

        press(&mut tool, 10.0, 10.0);
        let events = tool.handle_mouse(
            &InputEvent::MousePressed {
                button: MouseButton::Right,
                pos: Point::new(10.0, 10.0),
            },
            &mapper(),
        );
        assert_eq!(events, vec![ToolEvent::Cancelled]);

        let events = release(&mut tool, 20.0, 20.0);
        assert!(events.is_empty());
        assert_eq!(std::fs::read_to_string(&label).unwrap(), "");
    }
}
