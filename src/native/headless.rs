//! In-process engine adapter.
//!
//! [`HeadlessEngine`] keeps the same per-window bookkeeping a native engine binding does (window
//! table, window ids, per-window touch gestures) and turns host input into engine-side input
//! records instead of feeding a real engine. Desktop runs and tests use it in place of a device
//! binding.

use crate::errors::HostError;
use crate::input::{MouseAction, MouseButtons, MouseEvent, TouchAction, TouchEvent, TouchPoint};
use crate::native::{InitParams, NativeEngine};
use crate::registry::DEFAULT_WINDOW;
use crate::surface::{SurfaceHandle, SurfaceSize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Id of a window that has not been bound to an engine window yet.
pub const UNBOUND_WINDOW_ID: i32 = -1;

/// Engine-side view of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeWindow {
    pub surface: SurfaceHandle,
    pub size: SurfaceSize,
    pub id: i32,
}

/// Input as delivered to the engine, addressed by engine window id.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    ScreenTouch {
        window_id: i32,
        index: i32,
        pressed: bool,
        canceled: bool,
        x: f32,
        y: f32,
        double_tap: bool,
    },
    ScreenDrag {
        window_id: i32,
        index: i32,
        x: f32,
        y: f32,
        relative_x: f32,
        relative_y: f32,
        pressure: f32,
        tilt_x: f32,
        tilt_y: f32,
    },
    Mouse {
        window_id: i32,
        action: MouseAction,
        buttons: MouseButtons,
        x: f32,
        y: f32,
    },
}

/// A call received through [`NativeEngine`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Initialize { size: SurfaceSize },
    Shutdown,
    UpdateSurface { window: String, surface: SurfaceHandle, size: SurfaceSize },
    RemoveSurface { window: String },
    Touch { window: String, action: TouchAction },
    Mouse { window: String, action: MouseAction },
    PointerCapture { window: String, captured: bool },
    Pause,
    Resume,
    FocusIn,
    FocusOut,
}

#[derive(Default)]
struct State {
    started: bool,
    fail_initialize: Option<String>,
    windows: BTreeMap<String, NativeWindow>,
    next_window_id: i32,
    /// Active pointers per engine window id
    touches: HashMap<i32, Vec<TouchPoint>>,
    input: Vec<EngineInput>,
    calls: Vec<EngineCall>,
}

#[derive(Default)]
pub struct HeadlessEngine {
    state: Mutex<State>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next [`NativeEngine::initialize`] fail with `reason`.
    pub fn fail_initialize(&self, reason: &str) {
        if let Ok(mut s) = self.state.lock() {
            s.fail_initialize = Some(reason.to_string());
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().map(|s| s.started).unwrap_or(false)
    }

    pub fn window(&self, name: &str) -> Option<NativeWindow> {
        self.state.lock().ok()?.windows.get(name).copied()
    }

    pub fn window_names(&self) -> Vec<String> {
        self.state.lock().map(|s| s.windows.keys().cloned().collect()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.calls.clear();
        }
    }

    /// Takes all engine input produced since the last call.
    pub fn drain_input(&self) -> Vec<EngineInput> {
        self.state.lock().map(|mut s| std::mem::take(&mut s.input)).unwrap_or_default()
    }

    fn record(&self, call: EngineCall) {
        if let Ok(mut s) = self.state.lock() {
            s.calls.push(call);
        }
    }
}

impl State {
    /// Binds a window to an engine window id once the engine runs. The default window is always 0.
    fn bind_window_id(&mut self, name: &str) {
        if !self.started {
            return;
        }
        let next = self.next_window_id;
        let Some(window) = self.windows.get_mut(name) else {
            return;
        };
        if name == DEFAULT_WINDOW {
            window.id = 0;
        } else if window.id == UNBOUND_WINDOW_ID {
            window.id = next;
            self.next_window_id += 1;
            log::info!("Bound window '{}' to engine window {}", name, window.id);
        }
    }

    fn window_id(&self, name: &str) -> i32 {
        self.windows.get(name).map(|w| w.id).unwrap_or(UNBOUND_WINDOW_ID)
    }

    fn handle_touch(&mut self, window_id: i32, event: &TouchEvent) {
        let points = &event.points;
        match event.action {
            TouchAction::Down => {
                self.touches.insert(window_id, points.clone());
                for p in points {
                    self.input.push(touch(window_id, p, true, false, event.double_tap));
                }
            }
            TouchAction::Move => {
                let Some(active) = self.touches.get_mut(&window_id) else {
                    return;
                };
                if active.len() != points.len() {
                    return;
                }
                for current in active.iter_mut() {
                    let Some(next) = points.iter().find(|p| p.id == current.id) else {
                        continue;
                    };
                    if current.x == next.x && current.y == next.y {
                        continue;
                    }
                    self.input.push(EngineInput::ScreenDrag {
                        window_id,
                        index: current.id,
                        x: next.x,
                        y: next.y,
                        relative_x: next.x - current.x,
                        relative_y: next.y - current.y,
                        pressure: next.pressure,
                        tilt_x: next.tilt_x,
                        tilt_y: next.tilt_y,
                    });
                    current.x = next.x;
                    current.y = next.y;
                }
            }
            TouchAction::Cancel | TouchAction::Up => {
                let canceled = event.action == TouchAction::Cancel;
                let active = self.touches.remove(&window_id).unwrap_or_default();
                for p in &active {
                    self.input.push(touch(window_id, p, false, canceled, event.double_tap));
                }
            }
            TouchAction::PointerDown => {
                if let Some(p) = points.iter().find(|p| p.id == event.pointer_id) {
                    self.touches.entry(window_id).or_default().push(*p);
                    self.input.push(touch(window_id, p, true, false, false));
                }
            }
            TouchAction::PointerUp => {
                let Some(active) = self.touches.get_mut(&window_id) else {
                    return;
                };
                if let Some(idx) = active.iter().position(|p| p.id == event.pointer_id) {
                    let p = active.remove(idx);
                    self.input.push(touch(window_id, &p, false, false, false));
                }
            }
            TouchAction::Other(code) => {
                log::debug!("Ignoring touch action {} for engine window {}", code, window_id);
            }
        }
    }
}

fn touch(window_id: i32, p: &TouchPoint, pressed: bool, canceled: bool, double_tap: bool) -> EngineInput {
    EngineInput::ScreenTouch {
        window_id,
        index: p.id,
        pressed,
        canceled,
        x: p.x,
        y: p.y,
        double_tap,
    }
}

impl NativeEngine for HeadlessEngine {
    fn name(&self) -> &str {
        "HeadlessEngine"
    }

    fn initialize(&self, params: InitParams) -> Result<(), HostError> {
        self.record(EngineCall::Initialize { size: params.size });

        let mut s = self.state.lock().map_err(|_| HostError::Poisoned)?;
        if let Some(reason) = s.fail_initialize.take() {
            return Err(HostError::EngineInit(reason));
        }

        s.windows.insert(
            DEFAULT_WINDOW.to_string(),
            NativeWindow { surface: params.main_surface, size: params.size, id: 0 },
        );
        s.next_window_id = 1;
        s.started = true;

        // Windows that were announced before the engine ran get their ids now
        let names: Vec<String> = s.windows.keys().cloned().collect();
        for name in names {
            s.bind_window_id(&name);
        }

        log::info!("Headless engine started ({}, {} args)", params.size, params.args.len());
        Ok(())
    }

    fn shutdown(&self) {
        self.record(EngineCall::Shutdown);
        if let Ok(mut s) = self.state.lock() {
            s.started = false;
            s.windows.clear();
            s.touches.clear();
        }
    }

    fn update_surface(&self, window: &str, surface: &SurfaceHandle, size: SurfaceSize) {
        self.record(EngineCall::UpdateSurface { window: window.to_string(), surface: *surface, size });

        let Ok(mut s) = self.state.lock() else {
            return;
        };

        let mut changed = false;
        let entry = s.windows.entry(window.to_string()).or_insert_with(|| {
            changed = true;
            NativeWindow { surface: *surface, size, id: UNBOUND_WINDOW_ID }
        });
        if entry.surface != *surface {
            changed = true;
            entry.surface = *surface;
        }
        entry.size = size;

        if window == DEFAULT_WINDOW && changed {
            log::warn!("Default window surface should never change");
        }

        s.bind_window_id(window);
    }

    fn remove_surface(&self, window: &str) {
        self.record(EngineCall::RemoveSurface { window: window.to_string() });

        // The default window lives as long as the engine
        if window == DEFAULT_WINDOW {
            return;
        }

        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if let Some(removed) = s.windows.remove(window) {
            s.touches.remove(&removed.id);
        }
    }

    fn dispatch_touch(&self, window: &str, event: &TouchEvent) {
        self.record(EngineCall::Touch { window: window.to_string(), action: event.action });

        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if !s.started {
            return;
        }

        let window_id = s.window_id(window);
        if window_id < 0 {
            log::error!("Could not find window for name: '{}'", window);
            return;
        }
        s.handle_touch(window_id, event);
    }

    fn dispatch_mouse(&self, window: &str, event: &MouseEvent) {
        self.record(EngineCall::Mouse { window: window.to_string(), action: event.action });

        let Ok(mut s) = self.state.lock() else {
            return;
        };
        if !s.started {
            return;
        }

        let window_id = s.window_id(window);
        if window_id < 0 {
            log::error!("Could not find window for name: '{}'", window);
            return;
        }
        s.input.push(EngineInput::Mouse {
            window_id,
            action: event.action,
            buttons: event.buttons,
            x: event.x,
            y: event.y,
        });
    }

    fn pointer_capture_changed(&self, window: &str, captured: bool) {
        self.record(EngineCall::PointerCapture { window: window.to_string(), captured });
    }

    fn pause(&self) {
        self.record(EngineCall::Pause);
    }

    fn resume(&self) {
        self.record(EngineCall::Resume);
    }

    fn focus_in(&self) {
        self.record(EngineCall::FocusIn);
    }

    fn focus_out(&self) {
        self.record(EngineCall::FocusOut);
    }
}
