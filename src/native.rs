//! Engine boundary.
//!
//! [`NativeEngine`] is the small capability surface the host needs from the embedded engine:
//! process lifecycle, per-window surface updates and input dispatch. Every call carries the window
//! name so the engine can route it to the right render target. Platform linkage (JNI, a C ABI,
//! an in-process engine) lives in adapters implementing this trait.
//!
//! The much larger callback contract some engines expect from their host is kept apart in
//! [`compat`], so none of it leaks into the surface or input paths.

use crate::errors::HostError;
use crate::input::{MouseEvent, TouchEvent};
use crate::surface::{SurfaceHandle, SurfaceSize};

pub mod compat;
pub mod headless;

/// Parameters for the one-time engine initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct InitParams {
    /// Surface of the default window.
    pub main_surface: SurfaceHandle,
    /// Size of the default window.
    pub size: SurfaceSize,
    /// Command line for the engine.
    pub args: Vec<String>,
}

pub trait NativeEngine {
    /// Name of the engine adapter, for logging.
    fn name(&self) -> &str;

    /// Starts the engine. Called at most once per host initialization.
    fn initialize(&self, params: InitParams) -> Result<(), HostError>;

    /// Stops the engine and releases every native window reference it holds.
    fn shutdown(&self);

    /// Points `window` at `surface` with the given size.
    fn update_surface(&self, window: &str, surface: &SurfaceHandle, size: SurfaceSize);

    /// Tells the engine to stop targeting `window`.
    fn remove_surface(&self, window: &str);

    fn dispatch_touch(&self, window: &str, event: &TouchEvent);

    fn dispatch_mouse(&self, window: &str, event: &MouseEvent);

    fn pointer_capture_changed(&self, _window: &str, _captured: bool) {}

    // Lifecycle capability. Engines without a notion of these can ignore them.

    fn pause(&self) {}

    fn resume(&self) {}

    fn focus_in(&self) {}

    fn focus_out(&self) {}
}
