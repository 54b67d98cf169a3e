//! Abstract input events consumed by the labeling core.
//!
//! The windowing toolkit translates its native mouse/keyboard callbacks into
//! these types before handing them to [`crate::session::Session::handle_event`];
//! the core never sees toolkit types.

/// A point in widget (display) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Mouse buttons the labelers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Abstract key codes for the bindings the labelers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    D,
    G,
    S,
    Z,
    Left,
    Right,
    Delete,
    Escape,
}

/// One discrete input event in widget space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MousePressed { button: MouseButton, pos: Point },
    MouseMoved { pos: Point },
    MouseReleased { button: MouseButton, pos: Point },
    KeyPressed { key: KeyCode, ctrl: bool },
}
