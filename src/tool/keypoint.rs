//! Bounding box + keypoint labeler.
//!
//! Owns the per-image annotation state (store, visibility subset, undo
//! history, workflow state machine, highlighted annotation) and wires input
//! events and panel operations through it.

use std::path::Path;

use crate::config::LabelerConfig;
use crate::event::{InputEvent, MouseButton};
use crate::format::{keypoint as keypoint_format, LabelError, ParseReport};
use crate::keybindings::Action;
use crate::mapper::DisplayMapper;
use crate::model::{
    remap_index_after_remove, AnnotationSet, Visibility, VisibilitySet,
};
use crate::tool::{LabelTool, Rejection, ToolEvent};
use crate::undo::{self, Command, UndoStack};
use crate::workflow::{EditContext, Workflow, WorkflowState};

/// The keypoint labeling tool.
pub struct KeypointTool {
    config: LabelerConfig,
    store: AnnotationSet,
    visible: VisibilitySet,
    undo: UndoStack,
    workflow: Workflow,
    highlighted: Option<usize>,
    current_class: usize,
}

impl KeypointTool {
    pub fn new(config: LabelerConfig) -> Self {
        Self {
            config,
            store: AnnotationSet::new(),
            visible: VisibilitySet::new(),
            undo: UndoStack::new(),
            workflow: Workflow::new(),
            highlighted: None,
            current_class: 0,
        }
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.store
    }

    pub fn visible(&self) -> &VisibilitySet {
        &self.visible
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn current_class(&self) -> usize {
        self.current_class
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.workflow.state()
    }

    /// Change the class used for new bounding boxes. Ignored when out of
    /// range of the configured class list.
    pub fn set_current_class(&mut self, class_id: usize) -> bool {
        if class_id < self.config.class_count() {
            self.current_class = class_id;
            true
        } else {
            false
        }
    }

    /// Start drawing a bounding box with the current class.
    pub fn start_box(&mut self) -> Vec<ToolEvent> {
        self.workflow.start_box(self.current_class)
    }

    /// Select a class and start drawing in one step (digit shortcuts).
    pub fn select_class_and_start(&mut self, class_id: usize) -> Vec<ToolEvent> {
        if !self.set_current_class(class_id) {
            return Vec::new();
        }
        self.start_box()
    }

    /// Begin (or resume) keypoint placement on an existing annotation.
    pub fn start_keypoints(&mut self, annotation: usize) -> Vec<ToolEvent> {
        self.workflow.start_keypoints(annotation, &self.store)
    }

    /// Change a keypoint's visibility flag, recording undo.
    pub fn set_keypoint_visibility(
        &mut self,
        annotation: usize,
        keypoint: usize,
        visibility: Visibility,
    ) -> Vec<ToolEvent> {
        match self
            .store
            .set_keypoint_visibility(annotation, keypoint, visibility)
        {
            Ok(previous) => {
                self.undo.push(Command::SetVisibility {
                    annotation,
                    keypoint,
                    previous,
                });
                Vec::new()
            }
            Err(e) => {
                log::warn!("visibility change refused: {}", e);
                vec![ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                }]
            }
        }
    }

    /// Change an annotation's class, recording undo. Out-of-range class ids
    /// are ignored.
    pub fn set_class(&mut self, annotation: usize, class_id: usize) -> Vec<ToolEvent> {
        if class_id >= self.config.class_count() {
            return Vec::new();
        }
        match self.store.set_class(annotation, class_id) {
            Ok(previous) => {
                self.undo.push(Command::SetClass {
                    annotation,
                    previous,
                });
                Vec::new()
            }
            Err(e) => {
                log::warn!("class change refused: {}", e);
                vec![ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                }]
            }
        }
    }

    /// Clear a keypoint slot back to absent, recording undo.
    pub fn delete_keypoint(&mut self, annotation: usize, keypoint: usize) -> Vec<ToolEvent> {
        match self.store.clear_keypoint(annotation, keypoint) {
            Ok(previous) => {
                self.undo.push(Command::SetKeypoint {
                    annotation,
                    keypoint,
                    previous,
                });
                Vec::new()
            }
            Err(e) => {
                log::warn!("keypoint delete refused: {}", e);
                vec![ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                }]
            }
        }
    }

    /// Remove a whole annotation, recording undo and remapping every stored
    /// index reference.
    pub fn delete_annotation(&mut self, index: usize) -> Vec<ToolEvent> {
        match self.store.remove(index) {
            Ok(snapshot) => {
                self.undo.push(Command::RemoveAnnotation {
                    index,
                    annotation: snapshot,
                });
                self.visible.remap_after_remove(index);
                self.highlighted = remap_index_after_remove(self.highlighted, index);
                self.workflow.note_removed(index);
                vec![ToolEvent::AnnotationRemoved { index }]
            }
            Err(e) => {
                log::warn!("annotation delete refused: {}", e);
                vec![ToolEvent::Rejected {
                    reason: Rejection::StaleAnnotation,
                }]
            }
        }
    }

    /// Remove the currently highlighted annotation, if any.
    pub fn delete_highlighted(&mut self) -> Vec<ToolEvent> {
        match self.highlighted {
            Some(index) => self.delete_annotation(index),
            None => Vec::new(),
        }
    }

    /// Toggle whether an annotation is rendered.
    pub fn set_annotation_visible(&mut self, index: usize, visible: bool) {
        self.visible.set(index, visible);
    }

    /// Undo the most recent edit. Returns false when the history is empty.
    pub fn undo(&mut self) -> bool {
        // Structural undos move annotations around; keep the placement
        // target of an active workflow in step before applying.
        match self.undo.last() {
            Some(Command::AddBox { index }) => {
                let index = *index;
                self.workflow.note_removed(index);
            }
            Some(Command::RemoveAnnotation { index, .. }) => {
                let index = *index;
                self.workflow.note_inserted(index);
            }
            _ => {}
        }
        undo::undo_last(
            &mut self.undo,
            &mut self.store,
            &mut self.visible,
            &mut self.highlighted,
        )
    }

    /// Cancel the in-progress drawing or placement.
    pub fn cancel(&mut self) -> Vec<ToolEvent> {
        self.workflow.cancel()
    }

    fn handle_left_click(&mut self, ix: f32, iy: f32, mapper: &DisplayMapper) -> Vec<ToolEvent> {
        let (image_w, image_h) = mapper.image_size();
        if self.workflow.state().is_active() {
            let mut ctx = EditContext {
                store: &mut self.store,
                visible: &mut self.visible,
                undo: &mut self.undo,
            };
            return self.workflow.click(ix, iy, image_w, image_h, &mut ctx);
        }

        // Idle: clicking a rendered annotation highlights it.
        let (nx, ny) = (ix / image_w, iy / image_h);
        let hit = self
            .store
            .iter()
            .enumerate()
            .position(|(i, ann)| self.visible.contains(i) && ann.bbox.contains_norm(nx, ny));
        if let Some(index) = hit {
            self.highlighted = Some(index);
            return vec![ToolEvent::Selected { index }];
        }
        Vec::new()
    }
}

impl LabelTool for KeypointTool {
    fn begin_image(&mut self, label_path: &Path) -> Result<ParseReport, LabelError> {
        // Reset first so a load failure still leaves a clean empty state.
        self.clear();
        let (annotations, report) = keypoint_format::load(label_path)?;
        self.visible = VisibilitySet::all(annotations.len());
        self.store = AnnotationSet::from_vec(annotations);
        Ok(report)
    }

    fn flush(&mut self, label_path: &Path) -> Result<(), LabelError> {
        keypoint_format::save(label_path, self.store.as_slice())
    }

    fn handle_mouse(&mut self, event: &InputEvent, mapper: &DisplayMapper) -> Vec<ToolEvent> {
        match event {
            InputEvent::MousePressed {
                button: MouseButton::Left,
                pos,
            } => {
                // Clicks outside the displayed image are dropped, not snapped.
                match mapper.to_image(pos.x, pos.y) {
                    Some((ix, iy)) => self.handle_left_click(ix, iy, mapper),
                    None => Vec::new(),
                }
            }
            InputEvent::MousePressed {
                button: MouseButton::Right,
                ..
            } => self.cancel(),
            // The crosshair preview during moves is a display-layer concern.
            _ => Vec::new(),
        }
    }

    fn apply_action(&mut self, action: Action) -> Vec<ToolEvent> {
        match action {
            Action::SelectClass(class_id) => self.select_class_and_start(class_id),
            Action::Undo => {
                self.undo();
                Vec::new()
            }
            Action::Cancel => self.cancel(),
            Action::DeleteSelection => self.delete_highlighted(),
            _ => Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.store = AnnotationSet::new();
        self.visible = VisibilitySet::new();
        self.undo.clear();
        self.workflow.reset();
        self.highlighted = None;
    }
}
