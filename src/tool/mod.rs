//! The two labeler behaviors and the seam the session drives them through.
//!
//! A [`LabelTool`] owns all per-image annotation state. The session controller
//! calls `begin_image` / `flush` around navigation and forwards input events;
//! the tool answers with [`ToolEvent`]s the display layer can react to.

pub mod contour;
pub mod keypoint;

use std::fmt;
use std::path::Path;

use crate::event::InputEvent;
use crate::format::{LabelError, ParseReport};
use crate::keybindings::Action;
use crate::mapper::DisplayMapper;

/// Per-image lifecycle and input handling, implemented by both labelers.
pub trait LabelTool {
    /// Called when a new image becomes current. `label_path` is the sidecar
    /// file belonging to the image. All per-image state is replaced wholesale.
    fn begin_image(&mut self, label_path: &Path) -> Result<ParseReport, LabelError>;

    /// Persist the current image's annotations to the sidecar.
    fn flush(&mut self, label_path: &Path) -> Result<(), LabelError>;

    /// Handle one mouse event. The mapper is rebuilt by the caller for every
    /// event, so it always reflects the current widget and image sizes.
    fn handle_mouse(&mut self, event: &InputEvent, mapper: &DisplayMapper) -> Vec<ToolEvent>;

    /// Handle a tool-scope action (class selection, undo, cancel, ...).
    /// Session-scope actions (navigation, save) never reach the tool.
    fn apply_action(&mut self, action: Action) -> Vec<ToolEvent>;

    /// Drop all per-image state (no image loaded).
    fn clear(&mut self);
}

/// Why a click or request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Keypoint clicked outside the active annotation's bounding box.
    OutsideBox,
    /// Every keypoint slot of the annotation is already placed.
    AllKeypointsPlaced,
    /// The referenced annotation no longer exists.
    StaleAnnotation,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::OutsideBox => {
                write!(f, "Keypoint is outside the bounding box")
            }
            Rejection::AllKeypointsPlaced => {
                write!(f, "All keypoints are already placed")
            }
            Rejection::StaleAnnotation => {
                write!(f, "The annotation no longer exists")
            }
        }
    }
}

/// Observable outcome of handling one input event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// Bounding box drawing started for a class (crosshair cursor hint).
    DrawingStarted { class_id: usize },
    /// The first bounding box corner was registered.
    CornerPlaced,
    /// A new bounding box annotation was appended at `index`.
    BoxAdded { index: usize },
    /// A keypoint was placed into `slot` of the annotation.
    KeypointPlaced { annotation: usize, slot: usize },
    /// Every slot of the annotation is placed; placement ended.
    KeypointsComplete { annotation: usize },
    /// An existing annotation was removed from `index`.
    AnnotationRemoved { index: usize },
    /// An existing annotation was clicked while idle.
    Selected { index: usize },
    /// The in-progress drawing or placement was cancelled.
    Cancelled,
    /// A click or request was refused; show the reason to the operator.
    Rejected { reason: Rejection },
    /// A contour stroke was appended to the sidecar.
    StrokeCommitted { class_id: usize, points: usize },
    /// Writing to the sidecar failed; surface to the operator.
    IoFailed { message: String },
}
