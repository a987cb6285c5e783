//! Legacy host callback contract.
//!
//! Some engines expect their host to implement a wide callback interface (sensors, gamepads,
//! editor settings, renderer lifecycle, ...). None of it is needed to multiplex windows, so it is
//! kept out of [`NativeEngine`] and collected here with no-op defaults. Hosts override what they
//! actually support.

use crate::input::TouchEvent;
use crate::native::NativeEngine;
use crate::registry::DEFAULT_WINDOW;
use std::sync::Arc;

#[allow(unused_variables)]
pub trait EngineHostShim {
    fn back(&self) {}

    fn magnify(&self, x: f32, y: f32, factor: f32) {}

    fn pan(&self, x: f32, y: f32, delta_x: f32, delta_y: f32) {}

    fn accelerometer(&self, x: f32, y: f32, z: f32) {}

    fn gravity(&self, x: f32, y: f32, z: f32) {}

    fn magnetometer(&self, x: f32, y: f32, z: f32) {}

    fn gyroscope(&self, x: f32, y: f32, z: f32) {}

    fn key(&self, keycode: i32, physical_keycode: i32, unicode: i32, pressed: bool, echo: bool) {}

    fn joy_button(&self, device: i32, button: i32, pressed: bool) {}

    fn joy_axis(&self, device: i32, axis: i32, value: f32) {}

    fn joy_hat(&self, device: i32, hat_x: i32, hat_y: i32) {}

    fn joy_connection_changed(&self, device: i32, connected: bool, name: &str) {}

    fn focus_in(&self) {}

    fn focus_out(&self) {}

    fn tts_callback(&self, event: i32, id: i32, position: i32) {}

    fn editor_setting(&self, key: &str) -> Option<String> {
        None
    }

    fn set_editor_setting(&self, key: &str, value: &str) {}

    fn permission_result(&self, permission: &str, granted: bool) {}

    fn night_mode_changed(&self) {}

    fn hardware_keyboard_connected(&self, connected: bool) {}

    fn file_picker_result(&self, ok: bool, paths: &[String]) {}

    fn set_virtual_keyboard_height(&self, height: i32) {}

    fn renderer_resumed(&self) {}

    fn renderer_paused(&self) {}

    fn should_dispatch_input_to_render_thread(&self) -> bool {
        false
    }

    fn is_editor_hint(&self) -> bool {
        false
    }

    fn is_project_manager_hint(&self) -> bool {
        false
    }

    fn set_pointer_icon(&self, icon: i32) {}
}

/// Adapts the legacy, window-less callbacks onto a [`NativeEngine`].
///
/// Engines built against the single-window contract report input without a window name; that
/// input belongs to the default window.
pub struct CompatShim {
    engine: Arc<dyn NativeEngine + Send + Sync>,
}

impl CompatShim {
    pub fn new(engine: Arc<dyn NativeEngine + Send + Sync>) -> Self {
        Self { engine }
    }

    /// Untagged touch input in the packed layout, routed to the default window.
    pub fn dispatch_touch_event(&self, event: i32, pointer: i32, pointer_count: usize, positions: &[f32], double_tap: bool) {
        let touch = TouchEvent::from_packed(event, pointer, pointer_count, positions, double_tap);
        self.engine.dispatch_touch(DEFAULT_WINDOW, &touch);
    }

    /// Untagged mouse input. Only windowed mouse input is delivered, so this is dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch_mouse_event(
        &self,
        event: i32,
        button_mask: i32,
        x: f32,
        y: f32,
        _delta_x: f32,
        _delta_y: f32,
        _double_click: bool,
        _relative: bool,
        _pressure: f32,
        _tilt_x: f32,
        _tilt_y: f32,
    ) {
        log::debug!("Dropping untagged mouse event {} ({:#x}) at {},{}", event, button_mask, x, y);
    }
}

impl EngineHostShim for CompatShim {
    fn focus_in(&self) {
        self.engine.focus_in();
    }

    fn focus_out(&self) {
        self.engine.focus_out();
    }
}
