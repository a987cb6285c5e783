//! Window lifecycle: attaching, resizing and detaching named surfaces.
//!
//! Named windows are bound straight to the host's surface; the engine renders into it and the
//! registry is not involved. The default window renders into a surface the registry owns, which
//! is reparented under whatever control the host currently shows. Every change to that control
//! goes through one [`Transaction`] so it becomes visible in a single frame.

use crate::compositor::{Compositor, Transaction};
use crate::config::HostConfig;
use crate::native::NativeEngine;
use crate::registry::{Attachment, SurfaceRegistry, DEFAULT_WINDOW};
use crate::surface::{ControlHandle, PixelFormat, SurfaceHandle, SurfaceSize};
use std::sync::Arc;

pub struct WindowManager {
    registry: SurfaceRegistry,
    compositor: Arc<dyn Compositor + Send + Sync>,
    engine: Arc<dyn NativeEngine + Send + Sync>,
    validate_attachments: bool,
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("registry", &self.registry)
            .field("engine", &self.engine.name())
            .field("validate_attachments", &self.validate_attachments)
            .finish()
    }
}

impl WindowManager {
    pub fn new(
        config: &HostConfig,
        compositor: Arc<dyn Compositor + Send + Sync>,
        engine: Arc<dyn NativeEngine + Send + Sync>,
    ) -> Self {
        Self {
            registry: SurfaceRegistry::new(compositor.clone(), config.pixel_format),
            compositor,
            engine,
            validate_attachments: config.validate_attachments,
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SurfaceRegistry {
        &mut self.registry
    }

    /// Points `name` at the host's surface.
    ///
    /// For the default window the owned surface is (re)attached under `parent` and resized as
    /// needed. Compositor failures are logged; the engine is told about the surface either way.
    pub fn update_window(
        &mut self,
        name: &str,
        parent: ControlHandle,
        host_surface: SurfaceHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        let size = SurfaceSize::new(width, height);

        if name != DEFAULT_WINDOW {
            log::debug!("Binding window '{}' directly to {} ({}, {:?})", name, host_surface, size, format);
            self.engine.update_surface(name, &host_surface, size);
            return;
        }

        let entry = match self.registry.get_or_create(DEFAULT_WINDOW, size) {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("Could not create surface for window '{}': {}", name, e);
                return;
            }
        };

        let wanted = Attachment { control: parent, surface: host_surface };
        let identity_changed = match entry.attachment() {
            None => true,
            Some(current) if current != wanted => true,
            Some(current) => self.validate_attachments && !self.compositor.is_valid(&current.control),
        };
        let size_changed = entry.size() != size;

        if identity_changed {
            if let Some(stale) = entry.clear_attachment() {
                log::debug!("Dropping stale attachment of window '{}' to {}", name, stale.control);
            }

            let mut tx = Transaction::new();
            tx.reparent(entry.control(), Some(parent)).set_visibility(entry.control(), true);
            if size_changed {
                tx.set_buffer_size(entry.control(), size);
            }

            match tx.apply(self.compositor.as_ref()) {
                Ok(()) => {
                    entry.attach(wanted);
                    entry.set_size(size);
                    log::info!("Attached window '{}' to {} ({})", name, parent, size);
                }
                Err(e) => log::error!("Failed to attach window '{}': {:#}", name, e),
            }
        } else if size_changed {
            let mut tx = Transaction::new();
            tx.set_buffer_size(entry.control(), size);

            match tx.apply(self.compositor.as_ref()) {
                Ok(()) => {
                    entry.set_size(size);
                    log::info!("Resized window '{}' to {}", name, size);
                }
                Err(e) => log::error!("Failed to resize window '{}': {:#}", name, e),
            }
        }

        let (surface, stored) = (entry.surface(), entry.size());
        self.engine.update_surface(DEFAULT_WINDOW, &surface, stored);
    }

    /// Detaches `name` and tells the engine to stop targeting it. Unknown names are not an error.
    pub fn remove_window(&mut self, name: &str) {
        if let Some(entry) = self.registry.get_mut(name) {
            let mut tx = Transaction::new();
            tx.reparent(entry.control(), None).set_visibility(entry.control(), false);

            if let Err(e) = tx.apply(self.compositor.as_ref()) {
                log::error!("Failed to detach window '{}': {:#}", name, e);
            }
            entry.clear_attachment();
            log::info!("Detached window '{}'", name);
        }

        self.engine.remove_surface(name);
        self.registry.remove(name);
    }

    /// Forwards the stored surface and size of `name` to the engine. Returns false, without
    /// calling the engine, if `name` is not registered.
    pub fn refresh_window(&self, name: &str) -> bool {
        match self.registry.get(name) {
            Some(entry) => {
                self.engine.update_surface(name, &entry.surface(), entry.size());
                true
            }
            None => false,
        }
    }

    /// Forwards the current surface and size of every registered window to the engine.
    pub fn refresh_all(&self) {
        for entry in self.registry.iter() {
            self.engine.update_surface(entry.name(), &entry.surface(), entry.size());
        }
    }
}
