//! View adapter.
//!
//! [`EngineView`] is what a host UI element embeds to show one engine window. It turns the
//! element's surface lifecycle into window updates and its input into engine input, all against
//! the shared host context.

use crate::host::watchers::WindowNotice;
use crate::host::{HostContext, SharedHost};
use crate::input::{InputEvent, MouseEvent, TouchEvent};
use crate::registry::DEFAULT_WINDOW;
use crate::surface::{ControlHandle, PixelFormat, SurfaceHandle};

#[derive(Debug)]
pub struct EngineView {
    window_name: String,
    host: SharedHost,
    captured: bool,
}

impl EngineView {
    /// A view showing the default window.
    pub fn new(host: SharedHost) -> Self {
        Self::with_window_name(host, DEFAULT_WINDOW)
    }

    pub fn with_window_name(host: SharedHost, name: &str) -> Self {
        Self {
            window_name: name.to_string(),
            host,
            captured: false,
        }
    }

    pub fn window_name(&self) -> &str {
        &self.window_name
    }

    /// Changes the window this view shows. Takes effect on the next surface change.
    pub fn set_window_name(&mut self, name: &str) {
        self.window_name = name.to_string();
    }

    pub fn has_pointer_capture(&self) -> bool {
        self.captured
    }

    fn with_host<R>(&self, f: impl FnOnce(&mut HostContext) -> R) -> Option<R> {
        match self.host.lock() {
            Ok(mut host) => Some(f(&mut host)),
            Err(_) => {
                log::error!("Host context poisoned, dropping call for window '{}'", self.window_name);
                None
            }
        }
    }

    pub fn on_surface_created(&self, surface: &SurfaceHandle) {
        log::info!("Surface created for window '{}': {}", self.window_name, surface);
    }

    /// The element's surface got a new size or format, or was created. Returns false if the host
    /// could not be reached.
    pub fn on_surface_changed(
        &self,
        control: ControlHandle,
        surface: SurfaceHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> bool {
        log::info!(
            "Surface changed for window '{}': {} {:?} {}x{}",
            self.window_name,
            surface,
            format,
            width,
            height
        );
        let notice = self.with_host(|host| host.update_window(&self.window_name, control, surface, format, width, height));
        self.deliver(notice)
    }

    pub fn on_surface_destroyed(&self) -> bool {
        log::info!("Surface removed for window '{}'", self.window_name);
        let notice = self.with_host(|host| host.remove_window(&self.window_name));
        self.deliver(notice)
    }

    /// Asks the host to re-send this view's window to the engine.
    pub fn refresh(&self) -> bool {
        let notice = self.with_host(|host| host.refresh_window(&self.window_name));
        self.deliver(notice)
    }

    // Watchers run here, after `with_host` has released the lock
    fn deliver(&self, notice: Option<WindowNotice>) -> bool {
        match notice {
            Some(notice) => {
                notice.deliver();
                true
            }
            None => false,
        }
    }

    fn dispatch(&self, event: InputEvent) -> bool {
        // Take the bridge out so the engine is not called under the host lock
        let Some(bridge) = self.with_host(|host| host.input_bridge()) else {
            return false;
        };
        bridge.dispatch(&self.window_name, &event);
        true
    }

    /// Returns true when the event was handed to the engine.
    pub fn on_touch(&self, event: TouchEvent) -> bool {
        self.dispatch(InputEvent::Touch(event))
    }

    pub fn on_mouse(&self, event: MouseEvent) -> bool {
        self.dispatch(InputEvent::Mouse(event))
    }

    pub fn on_generic_motion(&self, event: MouseEvent) -> bool {
        self.dispatch(InputEvent::GenericMotion(event))
    }

    /// Motion while the pointer is captured. Coordinates are relative.
    pub fn on_captured_pointer(&self, mut event: MouseEvent) -> bool {
        event.relative = true;
        self.dispatch(InputEvent::GenericMotion(event))
    }

    /// Tells the engine capture was requested. The view only counts as captured once the host
    /// reports it through [`on_pointer_capture_change`](Self::on_pointer_capture_change).
    pub fn request_pointer_capture(&self) {
        self.dispatch(InputEvent::PointerCapture(true));
    }

    pub fn release_pointer_capture(&self) {
        self.dispatch(InputEvent::PointerCapture(false));
    }

    /// The host granted or revoked pointer capture.
    pub fn on_pointer_capture_change(&mut self, has_capture: bool) {
        self.captured = has_capture;
        self.dispatch(InputEvent::PointerCapture(has_capture));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::backends::recording::RecordingCompositor;
    use crate::config::HostConfig;
    use crate::host::init_shared;
    use crate::input::{MouseAction, MouseButtons, TouchAction, TouchPoint};
    use crate::native::headless::{EngineCall, EngineInput, HeadlessEngine};
    use crate::surface::{DisplayMetrics, SurfaceSize};
    use std::sync::{Arc, Mutex};

    fn shared() -> (Arc<RecordingCompositor>, Arc<HeadlessEngine>, SharedHost) {
        let compositor = Arc::new(RecordingCompositor::new());
        let engine = Arc::new(HeadlessEngine::new());
        let host = HostContext::new(HostConfig::default(), compositor.clone(), engine.clone())
            .unwrap()
            .into_shared();
        (compositor, engine, host)
    }

    #[test]
    fn default_view_attaches_and_detaches() {
        let (compositor, engine, host) = shared();
        init_shared(&host, Some(DisplayMetrics::new(800, 600))).unwrap();
        let view = EngineView::new(host.clone());

        let parent = ControlHandle::new();
        assert!(view.on_surface_changed(parent, SurfaceHandle::new(), PixelFormat::Rgba8888, 800, 600));
        {
            let host = host.lock().unwrap();
            let entry = host.windows().registry().get("").unwrap();
            assert_eq!(entry.attachment().map(|a| a.control), Some(parent));
            assert_eq!(compositor.control_state(&entry.control()).unwrap().parent, Some(parent));
        }

        assert!(view.on_surface_destroyed());
        let host = host.lock().unwrap();
        assert!(!host.windows().registry().get("").unwrap().is_attached());
        assert_eq!(engine.calls().last(), Some(&EngineCall::RemoveSurface { window: "".into() }));
    }

    #[test]
    fn named_view_binds_host_surface() {
        let (_, engine, host) = shared();
        let mut view = EngineView::new(host);
        view.set_window_name("minimap");

        let surface = SurfaceHandle::new();
        view.on_surface_created(&surface);
        view.on_surface_changed(ControlHandle::new(), surface, PixelFormat::Rgba8888, 256, 256);

        assert_eq!(
            engine.calls(),
            vec![EngineCall::UpdateSurface {
                window: "minimap".into(),
                surface,
                size: SurfaceSize::new(256, 256),
            }]
        );
    }

    #[test]
    fn input_is_tagged_with_the_view_window() {
        let (_, engine, host) = shared();
        init_shared(&host, Some(DisplayMetrics::new(100, 100))).unwrap();
        let view = EngineView::new(host);

        assert!(view.on_touch(TouchEvent::new(TouchAction::Down, 0, vec![TouchPoint::new(0, 5.0, 5.0)])));
        assert!(view.on_mouse(MouseEvent::new(MouseAction::Down, MouseButtons::PRIMARY, 1.0, 1.0)));

        let input = engine.drain_input();
        assert_eq!(input.len(), 2);
        assert!(matches!(input[0], EngineInput::ScreenTouch { window_id: 0, pressed: true, .. }));
        assert!(matches!(input[1], EngineInput::Mouse { window_id: 0, .. }));
    }

    #[test]
    fn captured_motion_is_relative_generic_motion() {
        let (_, engine, host) = shared();
        let mut view = EngineView::with_window_name(host, "cam");

        view.request_pointer_capture();
        assert!(!view.has_pointer_capture());
        view.on_pointer_capture_change(true);
        assert!(view.has_pointer_capture());
        view.on_captured_pointer(MouseEvent::new(MouseAction::Move, MouseButtons::empty(), 3.0, -2.0));
        view.on_generic_motion(MouseEvent::new(MouseAction::HoverMove, MouseButtons::empty(), 0.0, 0.0));
        view.release_pointer_capture();
        assert!(view.has_pointer_capture());
        view.on_pointer_capture_change(false);
        assert!(!view.has_pointer_capture());

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::PointerCapture { window: "cam".into(), captured: true },
                EngineCall::PointerCapture { window: "cam".into(), captured: true },
                EngineCall::Mouse { window: "cam".into(), action: MouseAction::Move },
                EngineCall::Mouse { window: "cam".into(), action: MouseAction::HoverMove },
                EngineCall::PointerCapture { window: "cam".into(), captured: false },
                EngineCall::PointerCapture { window: "cam".into(), captured: false },
            ]
        );
    }

    #[test]
    fn denied_capture_leaves_view_uncaptured() {
        let (_, _, host) = shared();
        let view = EngineView::with_window_name(host, "cam");

        view.request_pointer_capture();
        assert!(!view.has_pointer_capture());
    }

    #[test]
    fn surface_watchers_run_after_the_host_is_released() {
        let (_, _, host) = shared();
        let weak = Arc::downgrade(&host);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        host.lock()
            .unwrap()
            .register_watcher(
                1,
                "hud",
                Arc::new(move |bound| {
                    let Some(host) = weak.upgrade() else { return };
                    let free = host.try_lock().is_ok();
                    sink.lock().unwrap().push((bound, free));
                }),
            )
            .unwrap();

        let view = EngineView::with_window_name(host, "hud");
        assert!(view.on_surface_changed(ControlHandle::new(), SurfaceHandle::new(), PixelFormat::Rgba8888, 64, 64));
        assert!(view.refresh());
        assert!(view.on_surface_destroyed());

        assert_eq!(*seen.lock().unwrap(), vec![(true, true), (true, true), (false, true)]);
    }

    #[test]
    fn poisoned_host_is_reported() {
        let (_, engine, host) = shared();
        let poisoner = host.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the host");
        })
        .join();

        let view = EngineView::new(host);
        assert!(!view.on_touch(TouchEvent::new(TouchAction::Down, 0, vec![])));
        assert!(!view.on_surface_destroyed());
        assert!(engine.calls().is_empty());
    }
}
