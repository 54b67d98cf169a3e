//! Keybindings for the labeling tools.
//!
//! Maps abstract key presses to actions. Bindings are plain struct fields so
//! a settings surface can rebind them later.
//!
//! Note: bindings are not persisted in the config file yet; they reset to the
//! defaults on every start.

use crate::event::KeyCode;

/// Actions the interactive surface can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Select a class by index and start drawing a bounding box for it.
    SelectClass(usize),
    /// Undo the most recent annotation edit.
    Undo,
    /// Save the current image's annotations.
    Save,
    /// Navigate to the previous image.
    PrevImage,
    /// Navigate to the next image.
    NextImage,
    /// Open the jump-to-image dialog.
    JumpToImage,
    /// Delete the current image together with its label file.
    DeleteImage,
    /// Remove the currently highlighted annotation.
    DeleteSelection,
    /// Cancel the in-progress drawing or placement.
    Cancel,
}

/// Keybinding configuration for both labelers.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Undo binding (with Ctrl).
    pub undo: KeyCode,
    /// Save binding (with Ctrl).
    pub save: KeyCode,
    /// Delete-image binding (with Ctrl).
    pub delete_image: KeyCode,
    pub prev_image: KeyCode,
    pub next_image: KeyCode,
    pub jump: KeyCode,
    pub delete_selection: KeyCode,
    pub cancel: KeyCode,
    /// Digit keys selecting class 0..9 and starting a bounding box.
    pub class_keys: [KeyCode; 9],
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            undo: KeyCode::Z,
            save: KeyCode::S,
            delete_image: KeyCode::D,
            prev_image: KeyCode::Left,
            next_image: KeyCode::Right,
            jump: KeyCode::G,
            delete_selection: KeyCode::Delete,
            cancel: KeyCode::Escape,
            class_keys: [
                KeyCode::Key1,
                KeyCode::Key2,
                KeyCode::Key3,
                KeyCode::Key4,
                KeyCode::Key5,
                KeyCode::Key6,
                KeyCode::Key7,
                KeyCode::Key8,
                KeyCode::Key9,
            ],
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a key press to an action, if any.
    pub fn action_for(&self, key: KeyCode, ctrl: bool) -> Option<Action> {
        if ctrl {
            if key == self.undo {
                return Some(Action::Undo);
            }
            if key == self.save {
                return Some(Action::Save);
            }
            if key == self.delete_image {
                return Some(Action::DeleteImage);
            }
            return None;
        }

        if key == self.prev_image {
            return Some(Action::PrevImage);
        }
        if key == self.next_image {
            return Some(Action::NextImage);
        }
        if key == self.jump {
            return Some(Action::JumpToImage);
        }
        if key == self.delete_selection {
            return Some(Action::DeleteSelection);
        }
        if key == self.cancel {
            return Some(Action::Cancel);
        }

        self.class_keys
            .iter()
            .position(|k| *k == key)
            .map(Action::SelectClass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shortcuts() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.action_for(KeyCode::Z, true), Some(Action::Undo));
        assert_eq!(bindings.action_for(KeyCode::S, true), Some(Action::Save));
        assert_eq!(
            bindings.action_for(KeyCode::D, true),
            Some(Action::DeleteImage)
        );
        assert_eq!(
            bindings.action_for(KeyCode::Left, false),
            Some(Action::PrevImage)
        );
        assert_eq!(
            bindings.action_for(KeyCode::Right, false),
            Some(Action::NextImage)
        );
        assert_eq!(
            bindings.action_for(KeyCode::G, false),
            Some(Action::JumpToImage)
        );
        assert_eq!(
            bindings.action_for(KeyCode::Delete, false),
            Some(Action::DeleteSelection)
        );
        assert_eq!(
            bindings.action_for(KeyCode::Escape, false),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn test_digit_keys_select_classes() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.action_for(KeyCode::Key1, false),
            Some(Action::SelectClass(0))
        );
        assert_eq!(
            bindings.action_for(KeyCode::Key9, false),
            Some(Action::SelectClass(8))
        );
    }

    #[test]
    fn test_ctrl_gates_modified_shortcuts() {
        let bindings = KeyBindings::new();
        // Z without Ctrl is not undo, and digits with Ctrl do nothing.
        assert_eq!(bindings.action_for(KeyCode::Z, false), None);
        assert_eq!(bindings.action_for(KeyCode::Key1, true), None);
    }
}
