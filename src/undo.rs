//! Undo support for annotation edits.
//!
//! Every mutating operation pushes a command holding just enough state to
//! reverse itself. A single LIFO stack, no redo; the stack is discarded
//! wholesale whenever the loaded image changes, so undo never crosses images.

use crate::model::{
    remap_index_after_insert, remap_index_after_remove, Annotation, AnnotationSet, Keypoint,
    Visibility, VisibilitySet,
};

/// A reversible record of one annotation mutation.
#[derive(Debug, Clone)]
pub enum Command {
    /// A bounding box annotation was appended at `index`.
    AddBox { index: usize },
    /// A keypoint slot changed (placed or cleared); the previous triple is kept.
    SetKeypoint {
        annotation: usize,
        keypoint: usize,
        previous: Keypoint,
    },
    /// A keypoint's visibility flag changed.
    SetVisibility {
        annotation: usize,
        keypoint: usize,
        previous: Visibility,
    },
    /// An annotation's class changed.
    SetClass { annotation: usize, previous: usize },
    /// An annotation was removed from `index`; the full snapshot is kept.
    RemoveAnnotation { index: usize, annotation: Annotation },
}

impl Command {
    /// Human-readable description of this command.
    pub fn description(&self) -> &'static str {
        match self {
            Command::AddBox { .. } => "Add bounding box",
            Command::SetKeypoint { .. } => "Edit keypoint",
            Command::SetVisibility { .. } => "Change keypoint visibility",
            Command::SetClass { .. } => "Change class",
            Command::RemoveAnnotation { .. } => "Delete annotation",
        }
    }
}

/// LIFO history of annotation edits for the current image.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    commands: Vec<Command>,
}

impl UndoStack {
    /// Create a new empty undo stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command.
    pub fn push(&mut self, command: Command) {
        log::debug!("📝 undo: pushed '{}'", command.description());
        self.commands.push(command);
    }

    /// Take the most recent command off the stack.
    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop()
    }

    /// Most recent command without removing it.
    pub fn last(&self) -> Option<&Command> {
        self.commands.last()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Drop all history (image switch).
    pub fn clear(&mut self) {
        if !self.commands.is_empty() {
            log::debug!("🗑️ undo history cleared ({} commands)", self.commands.len());
        }
        self.commands.clear();
    }
}

/// Pop the most recent command and reverse it against the store.
///
/// The visibility set and the highlighted reference are remapped alongside
/// structural changes. Returns `false` when there is nothing to undo. A
/// stale index inside a record degrades to a logged no-op, never a panic.
pub fn undo_last(
    stack: &mut UndoStack,
    store: &mut AnnotationSet,
    visible: &mut VisibilitySet,
    highlighted: &mut Option<usize>,
) -> bool {
    let Some(command) = stack.pop() else {
        return false;
    };
    log::debug!("⏪ undo: '{}'", command.description());
    apply(command, store, visible, highlighted);
    true
}

fn apply(
    command: Command,
    store: &mut AnnotationSet,
    visible: &mut VisibilitySet,
    highlighted: &mut Option<usize>,
) {
    match command {
        Command::AddBox { index } => match store.remove(index) {
            Ok(_) => {
                visible.remap_after_remove(index);
                *highlighted = remap_index_after_remove(*highlighted, index);
            }
            Err(e) => log::warn!("undo add: {}", e),
        },
        Command::SetKeypoint {
            annotation,
            keypoint,
            previous,
        } => {
            if let Err(e) = store.set_keypoint(annotation, keypoint, previous) {
                log::warn!("undo keypoint edit: {}", e);
            }
        }
        Command::SetVisibility {
            annotation,
            keypoint,
            previous,
        } => {
            if let Err(e) = store.set_keypoint_visibility(annotation, keypoint, previous) {
                log::warn!("undo visibility change: {}", e);
            }
        }
        Command::SetClass {
            annotation,
            previous,
        } => {
            if let Err(e) = store.set_class(annotation, previous) {
                log::warn!("undo class change: {}", e);
            }
        }
        Command::RemoveAnnotation { index, annotation } => {
            store.insert(index, annotation);
            visible.remap_after_insert(index);
            *highlighted = remap_index_after_insert(*highlighted, index);
        }
    }
}
