//! Interactive annotation workflow: bounding box drawing followed by
//! sequential keypoint placement.
//!
//! The machine is toolkit-independent. It consumes clicks already mapped to
//! image-pixel coordinates and mutates the annotation store through a
//! borrowed editing context, recording every mutation on the undo stack.

use crate::model::{AnnotationSet, BoundingBox, Keypoint, Visibility, VisibilitySet};
use crate::tool::{Rejection, ToolEvent};
use crate::undo::{Command, UndoStack};

/// Mutable annotation state borrowed by the workflow for one event dispatch.
pub struct EditContext<'a> {
    pub store: &'a mut AnnotationSet,
    pub visible: &'a mut VisibilitySet,
    pub undo: &'a mut UndoStack,
}

/// Where the interactive annotation sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkflowState {
    /// No annotation in progress; clicks select existing annotations.
    Idle,
    /// Waiting for one or both bounding box corners (image pixels).
    DrawingBox {
        class_id: usize,
        first_corner: Option<(f32, f32)>,
    },
    /// Filling keypoint slots of the annotation at this index. The target
    /// slot is recomputed by scanning on every click, so edits elsewhere can
    /// never leave a stale slot cursor here.
    PlacingKeypoints { annotation: usize },
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Idle
    }
}

impl WorkflowState {
    /// Whether an interactive drawing or placement is in progress
    /// (crosshair cursor hint for the frontend).
    pub fn is_active(&self) -> bool {
        !matches!(self, WorkflowState::Idle)
    }
}

/// The annotation workflow engine.
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Reset to idle, discarding any in-progress work (image switch).
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
    }

    /// Begin drawing a new bounding box for `class_id`. Any annotation
    /// already in progress is cancelled first.
    pub fn start_box(&mut self, class_id: usize) -> Vec<ToolEvent> {
        let mut events = self.cancel();
        self.state = WorkflowState::DrawingBox {
            class_id,
            first_corner: None,
        };
        events.push(ToolEvent::DrawingStarted { class_id });
        events
    }

    /// Begin (or resume) keypoint placement on an existing annotation.
    /// Refused when the annotation is gone or every slot is already placed.
    pub fn start_keypoints(&mut self, annotation: usize, store: &AnnotationSet) -> Vec<ToolEvent> {
        let mut events = self.cancel();
        match store.get(annotation) {
            None => {
                events.push(ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                });
            }
            Some(ann) if ann.first_absent_slot().is_none() => {
                events.push(ToolEvent::Rejected {
                    reason: Rejection::AllKeypointsPlaced,
                });
            }
            Some(_) => {
                self.state = WorkflowState::PlacingKeypoints { annotation };
            }
        }
        events
    }

    /// Handle a left click at image-pixel coordinates.
    pub fn click(
        &mut self,
        ix: f32,
        iy: f32,
        image_w: f32,
        image_h: f32,
        ctx: &mut EditContext<'_>,
    ) -> Vec<ToolEvent> {
        match self.state {
            WorkflowState::Idle => Vec::new(),
            WorkflowState::DrawingBox {
                class_id,
                first_corner: None,
            } => {
                self.state = WorkflowState::DrawingBox {
                    class_id,
                    first_corner: Some((ix, iy)),
                };
                vec![ToolEvent::CornerPlaced]
            }
            WorkflowState::DrawingBox {
                class_id,
                first_corner: Some((x1, y1)),
            } => {
                let bbox = BoundingBox::from_corners_px(x1, y1, ix, iy, image_w, image_h);
                let index = ctx.store.add_bounding_box(class_id, bbox);
                ctx.visible.insert(index);
                ctx.undo.push(Command::AddBox { index });
                // Box creation chains straight into keypoint placement.
                self.state = WorkflowState::PlacingKeypoints { annotation: index };
                vec![ToolEvent::BoxAdded { index }]
            }
            WorkflowState::PlacingKeypoints { annotation } => {
                self.place_keypoint(annotation, ix, iy, image_w, image_h, ctx)
            }
        }
    }

    fn place_keypoint(
        &mut self,
        annotation: usize,
        ix: f32,
        iy: f32,
        image_w: f32,
        image_h: f32,
        ctx: &mut EditContext<'_>,
    ) -> Vec<ToolEvent> {
        let Some(ann) = ctx.store.get(annotation) else {
            log::warn!("keypoint placement target {} no longer exists", annotation);
            self.state = WorkflowState::Idle;
            return vec![ToolEvent::Rejected {
                reason: Rejection::StaleAnnotation,
            }];
        };

        let (x1, y1, x2, y2) = ann.bbox.corners_px(image_w, image_h);
        if ix < x1 || ix > x2 || iy < y1 || iy > y2 {
            return vec![ToolEvent::Rejected {
                reason: Rejection::OutsideBox,
            }];
        }

        let Some(slot) = ann.first_absent_slot() else {
            self.state = WorkflowState::Idle;
            return vec![ToolEvent::Rejected {
                reason: Rejection::AllKeypointsPlaced,
            }];
        };

        let keypoint = Keypoint::new(ix / image_w, iy / image_h, Visibility::Visible);
        let previous = match ctx.store.set_keypoint(annotation, slot, keypoint) {
            Ok(previous) => previous,
            Err(e) => {
                log::warn!("keypoint placement failed: {}", e);
                self.state = WorkflowState::Idle;
                return vec![ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                }];
            }
        };
        ctx.undo.push(Command::SetKeypoint {
            annotation,
            keypoint: slot,
            previous,
        });

        let mut events = vec![ToolEvent::KeypointPlaced { annotation, slot }];
        let filled = ctx
            .store
            .get(annotation)
            .is_some_and(|ann| ann.first_absent_slot().is_none());
        if filled {
            self.state = WorkflowState::Idle;
            events.push(ToolEvent::KeypointsComplete { annotation });
        }
        events
    }

    /// Cancel whatever is in progress (right-click / Escape). An undrawn
    /// bounding box corner is discarded without touching the store; keypoints
    /// already committed stay committed.
    pub fn cancel(&mut self) -> Vec<ToolEvent> {
        if self.state.is_active() {
            self.state = WorkflowState::Idle;
            vec![ToolEvent::Cancelled]
        } else {
            Vec::new()
        }
    }

    /// Keep the placement target in step after an annotation was removed.
    pub fn note_removed(&mut self, index: usize) {
        if let WorkflowState::PlacingKeypoints { annotation } = self.state {
            if annotation == index {
                log::debug!("placement target {} removed, returning to idle", index);
                self.state = WorkflowState::Idle;
            } else if annotation > index {
                self.state = WorkflowState::PlacingKeypoints {
                    annotation: annotation - 1,
                };
            }
        }
    }

    /// Keep the placement target in step after an annotation was re-inserted.
    pub fn note_inserted(&mut self, index: usize) {
        if let WorkflowState::PlacingKeypoints { annotation } = self.state {
            if annotation >= index {
                self.state = WorkflowState::PlacingKeypoints {
                    annotation: annotation + 1,
                };
            }
        }
    }
}
