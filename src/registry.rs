//! Surface registry: one [`SurfaceEntry`] per window name.
//!
//! Entries are created on first reference. The default window (empty name) is created once during
//! host initialization, is persistent, and is never evicted. Every other entry is removed once its
//! window is detached.

use crate::compositor::Compositor;
use crate::errors::HostError;
use crate::surface::{ControlHandle, PixelFormat, SurfaceHandle, SurfaceSize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the default window.
pub const DEFAULT_WINDOW: &str = "";

/// The external parent a surface entry is currently reparented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub control: ControlHandle,
    pub surface: SurfaceHandle,
}

/// A named rendering surface owned by the registry.
#[derive(Debug)]
pub struct SurfaceEntry {
    name: String,
    control: ControlHandle,
    surface: SurfaceHandle,
    attachment: Option<Attachment>,
    size: SurfaceSize,
    persistent: bool,
}

impl SurfaceEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self) -> ControlHandle {
        self.control
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Buffer size as of the last successfully applied transaction.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_WINDOW
    }

    pub(crate) fn attach(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
    }

    pub(crate) fn clear_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }
}

pub struct SurfaceRegistry {
    compositor: Arc<dyn Compositor + Send + Sync>,
    format: PixelFormat,
    entries: HashMap<String, SurfaceEntry>,
}

impl std::fmt::Debug for SurfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceRegistry")
            .field("compositor", &self.compositor.name())
            .field("format", &self.format)
            .field("entries", &self.entries)
            .finish()
    }
}

impl SurfaceRegistry {
    pub fn new(compositor: Arc<dyn Compositor + Send + Sync>, format: PixelFormat) -> Self {
        Self {
            compositor,
            format,
            entries: HashMap::new(),
        }
    }

    /// Returns the entry for `name`, creating a non-persistent one sized `size` if unknown.
    ///
    /// An existing entry is returned untouched, whatever `size` says; resizing is the window
    /// manager's job.
    pub fn get_or_create(&mut self, name: &str, size: SurfaceSize) -> Result<&mut SurfaceEntry, HostError> {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let entry = build_entry(self.compositor.as_ref(), self.format, name, size, false)?;
                Ok(v.insert(entry))
            }
        }
    }

    /// Creates the persistent default entry. Calling this again returns the existing entry.
    pub fn create_default(&mut self, size: SurfaceSize) -> Result<&mut SurfaceEntry, HostError> {
        match self.entries.entry(DEFAULT_WINDOW.to_string()) {
            Entry::Occupied(e) => {
                log::debug!("Default surface already exists, keeping it");
                let entry = e.into_mut();
                entry.persistent = true;
                Ok(entry)
            }
            Entry::Vacant(v) => {
                let entry = build_entry(self.compositor.as_ref(), self.format, DEFAULT_WINDOW, size, true)?;
                Ok(v.insert(entry))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SurfaceEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SurfaceEntry> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes the entry unless it is persistent. Returns the removed entry.
    pub fn remove(&mut self, name: &str) -> Option<SurfaceEntry> {
        match self.entries.get(name) {
            Some(entry) if entry.persistent => None,
            Some(_) => self.entries.remove(name),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Window names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut v: Vec<String> = self.entries.keys().cloned().collect();
        v.sort_unstable();
        v
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfaceEntry> {
        self.entries.values()
    }
}

fn build_entry(
    compositor: &dyn Compositor,
    format: PixelFormat,
    name: &str,
    size: SurfaceSize,
    persistent: bool,
) -> Result<SurfaceEntry, HostError> {
    let (control, surface) = compositor
        .create_control(name, size, format)
        .map_err(HostError::Compositor)?;

    log::debug!("Created surface control for window '{}' ({}, {})", name, size, control);

    Ok(SurfaceEntry {
        name: name.to_string(),
        control,
        surface,
        attachment: None,
        size,
        persistent,
    })
}
