//! Input events and the dispatch bridge.
//!
//! Events arrive already decoded by the host's input handler. [`InputBridge`] forwards them to the
//! engine tagged with the window name, synchronously and unchanged.

use crate::native::NativeEngine;
use bitflags::bitflags;
use std::fmt::Display;
use std::sync::Arc;

/// Number of floats per pointer in the packed touch position layout:
/// `id, x, y, pressure, tilt_x, tilt_y`.
pub const PACKED_POINTER_STRIDE: usize = 6;

/// Touch actions, using the host platform's motion event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First pointer went down, a gesture begins
    Down,
    /// Last pointer went up, the gesture ends
    Up,
    /// One or more pointers moved
    Move,
    /// The gesture was aborted by the system
    Cancel,
    /// An additional pointer went down
    PointerDown,
    /// A non-last pointer went up
    PointerUp,
    Other(i32),
}

impl TouchAction {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => TouchAction::Down,
            1 => TouchAction::Up,
            2 => TouchAction::Move,
            3 => TouchAction::Cancel,
            5 => TouchAction::PointerDown,
            6 => TouchAction::PointerUp,
            other => TouchAction::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            TouchAction::Down => 0,
            TouchAction::Up => 1,
            TouchAction::Move => 2,
            TouchAction::Cancel => 3,
            TouchAction::PointerDown => 5,
            TouchAction::PointerUp => 6,
            TouchAction::Other(code) => code,
        }
    }
}

/// Mouse and stylus actions, using the host platform's motion event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    HoverMove,
    Scroll,
    HoverEnter,
    HoverExit,
    ButtonPress,
    ButtonRelease,
    Other(i32),
}

impl MouseAction {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => MouseAction::Down,
            1 => MouseAction::Up,
            2 => MouseAction::Move,
            7 => MouseAction::HoverMove,
            8 => MouseAction::Scroll,
            9 => MouseAction::HoverEnter,
            10 => MouseAction::HoverExit,
            11 => MouseAction::ButtonPress,
            12 => MouseAction::ButtonRelease,
            other => MouseAction::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            MouseAction::Down => 0,
            MouseAction::Up => 1,
            MouseAction::Move => 2,
            MouseAction::HoverMove => 7,
            MouseAction::Scroll => 8,
            MouseAction::HoverEnter => 9,
            MouseAction::HoverExit => 10,
            MouseAction::ButtonPress => 11,
            MouseAction::ButtonRelease => 12,
            MouseAction::Other(code) => code,
        }
    }
}

bitflags! {
    pub struct MouseButtons: u32 {
        const PRIMARY          = 0b0000_0001;
        const SECONDARY        = 0b0000_0010;
        const TERTIARY         = 0b0000_0100;
        const BACK             = 0b0000_1000;
        const FORWARD          = 0b0001_0000;
        const STYLUS_PRIMARY   = 0b0010_0000;
        const STYLUS_SECONDARY = 0b0100_0000;
    }
}

impl Display for MouseButtons {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (MouseButtons::PRIMARY, "Primary"),
            (MouseButtons::SECONDARY, "Secondary"),
            (MouseButtons::TERTIARY, "Tertiary"),
            (MouseButtons::BACK, "Back"),
            (MouseButtons::FORWARD, "Forward"),
            (MouseButtons::STYLUS_PRIMARY, "StylusPrimary"),
            (MouseButtons::STYLUS_SECONDARY, "StylusSecondary"),
        ];

        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if parts.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// A single pointer of a touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
}

impl TouchPoint {
    pub fn new(id: i32, x: f32, y: f32) -> Self {
        Self { id, x, y, pressure: 1.0, tilt_x: 0.0, tilt_y: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    /// Pointer that triggered `PointerDown`/`PointerUp`.
    pub pointer_id: i32,
    pub points: Vec<TouchPoint>,
    pub double_tap: bool,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointer_id: i32, points: Vec<TouchPoint>) -> Self {
        Self { action, pointer_id, points, double_tap: false }
    }

    pub fn pointer_count(&self) -> usize {
        self.points.len()
    }

    /// Builds an event from the packed layout used by native input handlers. Pointers that do not
    /// fit in `positions` are dropped.
    pub fn from_packed(event: i32, pointer_id: i32, pointer_count: usize, positions: &[f32], double_tap: bool) -> Self {
        let points = positions
            .chunks_exact(PACKED_POINTER_STRIDE)
            .take(pointer_count)
            .map(|p| TouchPoint {
                id: p[0] as i32,
                x: p[1],
                y: p[2],
                pressure: p[3],
                tilt_x: p[4],
                tilt_y: p[5],
            })
            .collect();

        Self { action: TouchAction::from_raw(event), pointer_id, points, double_tap }
    }

    /// Packs the pointers back into the native layout.
    pub fn packed_positions(&self) -> Vec<f32> {
        self.points
            .iter()
            .flat_map(|p| [p.id as f32, p.x, p.y, p.pressure, p.tilt_x, p.tilt_y])
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub buttons: MouseButtons,
    pub x: f32,
    pub y: f32,
    pub delta_x: f32,
    pub delta_y: f32,
    pub double_click: bool,
    /// Coordinates are relative motion (captured pointer) instead of a position.
    pub relative: bool,
    pub pressure: f32,
    pub tilt_x: f32,
    pub tilt_y: f32,
}

impl MouseEvent {
    pub fn new(action: MouseAction, buttons: MouseButtons, x: f32, y: f32) -> Self {
        Self {
            action,
            buttons,
            x,
            y,
            delta_x: 0.0,
            delta_y: 0.0,
            double_click: false,
            relative: false,
            pressure: 0.0,
            tilt_x: 0.0,
            tilt_y: 0.0,
        }
    }
}

/// Decoded host input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Touch(TouchEvent),
    Mouse(MouseEvent),
    /// Hover, scroll and captured-pointer motion. Routed like mouse input.
    GenericMotion(MouseEvent),
    /// The view gained (`true`) or lost pointer capture.
    PointerCapture(bool),
}

/// Forwards host input to the engine. Holds no state of its own.
#[derive(Clone)]
pub struct InputBridge {
    engine: Arc<dyn NativeEngine + Send + Sync>,
}

impl std::fmt::Debug for InputBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputBridge").field("engine", &self.engine.name()).finish()
    }
}

impl InputBridge {
    pub fn new(engine: Arc<dyn NativeEngine + Send + Sync>) -> Self {
        Self { engine }
    }

    pub fn dispatch(&self, window: &str, event: &InputEvent) {
        match event {
            InputEvent::Touch(touch) => self.engine.dispatch_touch(window, touch),
            InputEvent::Mouse(mouse) | InputEvent::GenericMotion(mouse) => self.engine.dispatch_mouse(window, mouse),
            InputEvent::PointerCapture(captured) => self.engine.pointer_capture_changed(window, *captured),
        }
    }
}
