//! The host context.
//!
//! [`HostContext`] owns everything one embedded engine needs on the host side: the window manager
//! (and through it the surface registry), the input bridge, the window watchers and the
//! run state. Views share one context as a [`SharedHost`].

use crate::compositor::Compositor;
use crate::config::HostConfig;
use crate::errors::HostError;
use crate::input::{InputBridge, InputEvent};
use crate::native::{InitParams, NativeEngine};
use crate::surface::{ControlHandle, DisplayMetrics, PixelFormat, SurfaceHandle};
use crate::window::WindowManager;
use std::sync::{Arc, Mutex};

pub mod watchers;

use watchers::{WindowCallback, WindowNotice, WindowWatchers};

/// A host context shared between the views of one process.
pub type SharedHost = Arc<Mutex<HostContext>>;

/// Whether the engine should currently be producing frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Paused on request of the engine user
    pub paused: bool,
    /// The host application is not in the foreground
    pub in_background: bool,
}

impl RunState {
    pub fn should_iterate(&self) -> bool {
        !self.paused && !self.in_background
    }
}

pub struct HostContext {
    config: HostConfig,
    engine: Arc<dyn NativeEngine + Send + Sync>,
    windows: WindowManager,
    input: InputBridge,
    watchers: WindowWatchers,
    initialized: bool,
    run_state: RunState,
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("engine", &self.engine.name())
            .field("windows", &self.windows)
            .field("watchers", &self.watchers)
            .field("initialized", &self.initialized)
            .field("run_state", &self.run_state)
            .finish()
    }
}

impl HostContext {
    pub fn new(
        config: HostConfig,
        compositor: Arc<dyn Compositor + Send + Sync>,
        engine: Arc<dyn NativeEngine + Send + Sync>,
    ) -> Result<Self, HostError> {
        config.validate()?;

        Ok(Self {
            windows: WindowManager::new(&config, compositor, engine.clone()),
            input: InputBridge::new(engine.clone()),
            watchers: WindowWatchers::new(),
            engine,
            config,
            initialized: false,
            run_state: RunState::default(),
        })
    }

    /// Wraps the context for sharing between views.
    pub fn into_shared(self) -> SharedHost {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Creates the default surface and starts the engine. Does nothing if already initialized.
    ///
    /// `display` describes the host's default display; without one there is nothing to size the
    /// default window to and initialization is aborted. The returned notice holds a call for every
    /// registered watcher; deliver it after releasing the host lock, or use [`init_shared`].
    pub fn init(&mut self, display: Option<DisplayMetrics>) -> Result<WindowNotice, HostError> {
        if self.initialized {
            log::debug!("Host already initialized");
            return Ok(WindowNotice::default());
        }

        if let Some(filter) = self.config.log_filter() {
            log::set_max_level(filter);
        }

        let Some(display) = display else {
            log::error!("Host display not set, abort init");
            return Err(HostError::MissingDisplay);
        };
        let size = display.size();

        let main_surface = match self.windows.registry_mut().create_default(size) {
            Ok(entry) => entry.surface(),
            Err(e) => {
                log::error!("Unable to create the default surface: {}", e);
                return Err(e);
            }
        };

        let params = InitParams {
            main_surface,
            size,
            args: self.config.engine_args.clone(),
        };
        if let Err(e) = self.engine.initialize(params) {
            log::error!("Unable to initialize engine '{}': {}", self.engine.name(), e);
            return Err(e);
        }

        self.initialized = true;
        log::info!("Host initialized with engine '{}' ({})", self.engine.name(), size);

        // Windows that were set up before the engine ran
        self.windows.refresh_all();
        Ok(self.watchers.notify_all())
    }

    /// Stops the engine. Does nothing if not initialized.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.engine.shutdown();
        self.initialized = false;
        self.run_state.paused = false;
        log::info!("Host shut down");
    }

    /// See [`WindowManager::update_window`]. Returns the call for the watcher of `name`.
    pub fn update_window(
        &mut self,
        name: &str,
        parent: ControlHandle,
        host_surface: SurfaceHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> WindowNotice {
        self.windows.update_window(name, parent, host_surface, format, width, height);
        self.watchers.notify(name, true)
    }

    /// See [`WindowManager::remove_window`]. Returns the call for the watcher of `name`.
    pub fn remove_window(&mut self, name: &str) -> WindowNotice {
        self.windows.remove_window(name);
        self.watchers.notify(name, false)
    }

    /// Re-sends the stored surface and size of `name` to the engine. Returns the call for the
    /// watcher of `name`, which is produced whether or not the window is registered.
    pub fn refresh_window(&self, name: &str) -> WindowNotice {
        if !self.windows.refresh_window(name) {
            log::debug!("No surface registered for window '{}'", name);
        }
        self.watchers.notify(name, true)
    }

    pub fn dispatch_input(&self, window: &str, event: &InputEvent) {
        self.input.dispatch(window, event);
    }

    /// A bridge that can be used without holding the context lock.
    pub fn input_bridge(&self) -> InputBridge {
        self.input.clone()
    }

    pub fn register_watcher(&mut self, handle: u64, name: &str, callback: WindowCallback) -> Result<(), HostError> {
        self.watchers.register(handle, name, callback)
    }

    pub fn unregister_watcher(&mut self, handle: u64) {
        self.watchers.unregister(handle);
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// True if the engine should render the next frame.
    pub fn should_iterate(&self) -> bool {
        self.initialized && self.run_state.should_iterate()
    }

    pub fn is_paused(&self) -> bool {
        self.run_state.paused
    }

    /// Stops iterating until [`resume`](Self::resume). The engine itself is not told.
    pub fn pause(&mut self) {
        self.run_state.paused = true;
    }

    pub fn resume(&mut self) {
        self.run_state.paused = false;
    }

    /// The host application went to the background.
    pub fn app_pause(&mut self) {
        self.run_state.in_background = true;
        if self.initialized {
            self.engine.pause();
        }
    }

    /// The host application came back. Iteration restarts once focus returns.
    pub fn app_resume(&mut self) {
        if self.initialized {
            self.engine.resume();
        }
    }

    pub fn focus_in(&mut self) {
        self.run_state.in_background = false;
        if self.initialized {
            self.engine.focus_in();
        }
    }

    pub fn focus_out(&mut self) {
        self.run_state.in_background = true;
        if self.initialized {
            self.engine.focus_out();
        }
    }
}

/// Initializes a shared host and delivers the watcher calls once the lock is released.
pub fn init_shared(host: &SharedHost, display: Option<DisplayMetrics>) -> Result<(), HostError> {
    let notice = host.lock().map_err(|_| HostError::Poisoned)?.init(display)?;
    notice.deliver();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::backends::recording::RecordingCompositor;
    use crate::native::headless::{EngineCall, HeadlessEngine};
    use crate::registry::DEFAULT_WINDOW;
    use crate::surface::SurfaceSize;

    fn host() -> (Arc<RecordingCompositor>, Arc<HeadlessEngine>, HostContext) {
        let _ = env_logger::builder().is_test(true).try_init();
        let compositor = Arc::new(RecordingCompositor::new());
        let engine = Arc::new(HeadlessEngine::new());
        let config = HostConfig::builder().engine_arg("--verbose").build().unwrap();
        let host = HostContext::new(config, compositor.clone(), engine.clone()).unwrap();
        (compositor, engine, host)
    }

    fn display() -> Option<DisplayMetrics> {
        Some(DisplayMetrics::new(1080, 1920))
    }

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, WindowCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |bound| sink.lock().unwrap().push(bound)))
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = HostConfig { pixel_format: PixelFormat::Opaque, ..HostConfig::default() };
        let res = HostContext::new(config, Arc::new(RecordingCompositor::new()), Arc::new(HeadlessEngine::new()));
        assert!(matches!(res, Err(HostError::Config(_))));
    }

    #[test]
    fn init_creates_default_surface_and_starts_engine() {
        let (_, engine, mut host) = host();
        host.init(display()).unwrap().deliver();

        assert!(host.is_initialized());
        let entry = host.windows().registry().get(DEFAULT_WINDOW).unwrap();
        assert!(entry.is_persistent());
        assert_eq!(entry.size(), SurfaceSize::new(1080, 1920));

        let main = engine.window(DEFAULT_WINDOW).unwrap();
        assert_eq!(main.surface, entry.surface());
        assert_eq!(main.id, 0);
        assert_eq!(engine.calls()[0], EngineCall::Initialize { size: SurfaceSize::new(1080, 1920) });
    }

    #[test]
    fn init_is_guarded() {
        let (compositor, engine, mut host) = host();
        let (_, cb) = recorder();
        host.register_watcher(1, "", cb).unwrap();

        assert_eq!(host.init(display()).unwrap().len(), 1);
        assert!(host.init(display()).unwrap().is_empty());

        let inits = engine.calls().iter().filter(|c| matches!(c, EngineCall::Initialize { .. })).count();
        assert_eq!(inits, 1);
        assert_eq!(compositor.created_count(), 1);
    }

    #[test]
    fn init_without_display_aborts() {
        let (compositor, engine, mut host) = host();
        assert!(matches!(host.init(None), Err(HostError::MissingDisplay)));

        assert!(!host.is_initialized());
        assert!(engine.calls().is_empty());
        assert_eq!(compositor.created_count(), 0);
    }

    #[test]
    fn engine_failure_leaves_host_uninitialized_and_retryable() {
        let (_, engine, mut host) = host();
        engine.fail_initialize("missing pack");

        assert!(matches!(host.init(display()), Err(HostError::EngineInit(_))));
        assert!(!host.is_initialized());
        assert!(!host.should_iterate());

        host.init(display()).unwrap().deliver();
        assert!(host.is_initialized());
        assert!(engine.is_started());
    }

    #[test]
    fn init_leaves_log_level_alone_unless_configured() {
        let (_, _, host) = host();
        assert_eq!(host.config().log_filter(), None);

        let config = HostConfig::builder().log_level(crate::config::LogLevel::Warn).build().unwrap();
        assert_eq!(config.log_filter(), Some(log::LevelFilter::Warn));
    }

    #[test]
    fn init_refreshes_windows_and_notifies_watchers() {
        let (_, engine, mut host) = host();
        let (seen, cb) = recorder();
        host.register_watcher(1, "", cb).unwrap();

        let notice = host.init(display()).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        notice.deliver();

        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert!(matches!(
            engine.calls().last(),
            Some(EngineCall::UpdateSurface { window, .. }) if window.is_empty()
        ));
    }

    #[test]
    fn window_updates_notify_watchers() {
        let (_, _, mut host) = host();
        let (seen, cb) = recorder();
        host.register_watcher(9, "hud", cb).unwrap();

        host.update_window("hud", ControlHandle::new(), SurfaceHandle::new(), PixelFormat::Rgba8888, 10, 10).deliver();
        let other = host.update_window("other", ControlHandle::new(), SurfaceHandle::new(), PixelFormat::Rgba8888, 10, 10);
        assert!(other.is_empty());
        host.remove_window("hud").deliver();
        host.unregister_watcher(9);
        host.update_window("hud", ControlHandle::new(), SurfaceHandle::new(), PixelFormat::Rgba8888, 10, 10).deliver();

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn watchers_can_lock_the_shared_host() {
        let (_, _, host) = host();
        let shared = host.into_shared();
        let weak = Arc::downgrade(&shared);
        let reads = Arc::new(Mutex::new(Vec::new()));
        let sink = reads.clone();
        let cb: WindowCallback = Arc::new(move |_| {
            let Some(host) = weak.upgrade() else { return };
            let len = host.try_lock().map(|h| h.windows().registry().len()).ok();
            sink.lock().unwrap().push(len);
        });
        shared.lock().unwrap().register_watcher(1, "", cb).unwrap();

        init_shared(&shared, display()).unwrap();
        let notice = shared.lock().unwrap().refresh_window("");
        notice.deliver();

        assert_eq!(*reads.lock().unwrap(), vec![Some(1), Some(1)]);
    }

    #[test]
    fn refresh_window_resends_registered_surface() {
        let (_, engine, mut host) = host();
        host.init(display()).unwrap().deliver();
        let (seen, cb) = recorder();
        host.register_watcher(4, "", cb).unwrap();
        engine.clear_calls();

        host.refresh_window("").deliver();

        let surface = host.windows().registry().get("").unwrap().surface();
        assert_eq!(
            engine.calls(),
            vec![EngineCall::UpdateSurface { window: "".into(), surface, size: SurfaceSize::new(1080, 1920) }]
        );
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn refresh_unknown_window_only_notifies() {
        let (_, engine, mut host) = host();
        let (seen, cb) = recorder();
        host.register_watcher(5, "ghost", cb).unwrap();

        host.refresh_window("ghost").deliver();

        assert!(engine.calls().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn run_state_transitions() {
        let (_, engine, mut host) = host();
        host.init(display()).unwrap().deliver();
        engine.clear_calls();
        assert!(host.should_iterate());

        host.pause();
        assert!(host.is_paused());
        assert!(!host.should_iterate());
        host.resume();
        assert!(host.should_iterate());

        host.app_pause();
        assert!(!host.should_iterate());
        // resuming the app alone does not bring it back to the foreground
        host.app_resume();
        assert!(!host.should_iterate());
        host.focus_in();
        assert!(host.should_iterate());
        host.focus_out();
        assert_eq!(host.run_state(), RunState { paused: false, in_background: true });

        assert_eq!(
            engine.calls(),
            vec![EngineCall::Pause, EngineCall::Resume, EngineCall::FocusIn, EngineCall::FocusOut]
        );
    }

    #[test]
    fn lifecycle_before_init_is_not_forwarded() {
        let (_, engine, mut host) = host();
        host.app_pause();
        host.focus_in();
        assert!(engine.calls().is_empty());
        assert!(!host.should_iterate());
    }

    #[test]
    fn shutdown_stops_engine_once() {
        let (_, engine, mut host) = host();
        host.init(display()).unwrap().deliver();
        host.pause();

        host.shutdown();
        host.shutdown();

        assert!(!host.is_initialized());
        assert!(!host.is_paused());
        let shutdowns = engine.calls().iter().filter(|c| **c == EngineCall::Shutdown).count();
        assert_eq!(shutdowns, 1);
    }

    #[test]
    fn input_reaches_engine_through_context() {
        let (_, engine, host) = host();
        host.dispatch_input("", &InputEvent::PointerCapture(false));
        host.input_bridge().dispatch("x", &InputEvent::PointerCapture(true));

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::PointerCapture { window: "".into(), captured: false },
                EngineCall::PointerCapture { window: "x".into(), captured: true },
            ]
        );
    }
}
