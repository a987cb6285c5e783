use crate::compositor::{Compositor, SurfaceOp, Transaction};
use crate::surface::{ControlHandle, PixelFormat, SurfaceHandle, SurfaceSize};
use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Current state of a control created by the [`RecordingCompositor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub surface: SurfaceHandle,
    pub parent: Option<ControlHandle>,
    pub visible: bool,
    pub size: SurfaceSize,
    pub format: PixelFormat,
}

#[derive(Default)]
struct State {
    controls: HashMap<ControlHandle, ControlState>,
    names: HashMap<ControlHandle, String>,
    released: HashSet<ControlHandle>,
    applied: Vec<Transaction>,
    fail_next_apply: bool,
}

/// Compositor that keeps the display tree in memory and records every applied transaction.
///
/// Used when no platform compositor is available (desktop runs, tests). Controls handed in by the
/// host (parents) are accepted as-is until they are [released](Self::release).
#[derive(Default)]
pub struct RecordingCompositor {
    state: Mutex<State>,
}

impl RecordingCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All transactions applied so far, in order.
    pub fn applied(&self) -> Vec<Transaction> {
        self.state.lock().map(|s| s.applied.clone()).unwrap_or_default()
    }

    pub fn applied_count(&self) -> usize {
        self.state.lock().map(|s| s.applied.len()).unwrap_or_default()
    }

    /// Number of controls created through [`Compositor::create_control`].
    pub fn created_count(&self) -> usize {
        self.state.lock().map(|s| s.controls.len()).unwrap_or_default()
    }

    pub fn control_state(&self, control: &ControlHandle) -> Option<ControlState> {
        self.state.lock().ok()?.controls.get(control).copied()
    }

    pub fn control_name(&self, control: &ControlHandle) -> Option<String> {
        self.state.lock().ok()?.names.get(control).cloned()
    }

    /// Marks a control as released by its owner. Later transactions referencing it fail.
    pub fn release(&self, control: ControlHandle) {
        if let Ok(mut s) = self.state.lock() {
            s.released.insert(control);
        }
    }

    /// Makes the next [`Compositor::apply`] fail without touching the tree.
    pub fn fail_next_apply(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.fail_next_apply = true;
        }
    }
}

impl Compositor for RecordingCompositor {
    fn name(&self) -> &str {
        "RecordingCompositor"
    }

    fn create_control(&self, name: &str, size: SurfaceSize, format: PixelFormat) -> Result<(ControlHandle, SurfaceHandle)> {
        let mut s = self.state.lock().map_err(|_| anyhow!("compositor state poisoned"))?;

        let control = ControlHandle::new();
        let surface = SurfaceHandle::new();
        s.controls.insert(control, ControlState { surface, parent: None, visible: false, size, format });
        s.names.insert(control, name.to_string());

        Ok((control, surface))
    }

    fn is_valid(&self, control: &ControlHandle) -> bool {
        self.state.lock().map(|s| !s.released.contains(control)).unwrap_or(false)
    }

    fn apply(&self, transaction: Transaction) -> Result<()> {
        let mut s = self.state.lock().map_err(|_| anyhow!("compositor state poisoned"))?;

        if s.fail_next_apply {
            s.fail_next_apply = false;
            bail!("transaction rejected");
        }

        // Validate everything first so a rejected batch leaves the tree untouched
        for op in transaction.ops() {
            let control = op.control();
            if s.released.contains(&control) {
                bail!("{control} has been released");
            }
            if !s.controls.contains_key(&control) {
                bail!("{control} is not owned by this compositor");
            }
            if let SurfaceOp::Reparent { parent: Some(parent), .. } = op {
                if s.released.contains(parent) {
                    bail!("parent {parent} has been released");
                }
            }
        }

        for op in transaction.ops() {
            let Some(state) = s.controls.get_mut(&op.control()) else {
                continue;
            };
            match *op {
                SurfaceOp::Reparent { parent, .. } => state.parent = parent,
                SurfaceOp::SetVisibility { visible, .. } => state.visible = visible,
                SurfaceOp::SetBufferSize { size, .. } => state.size = size,
            }
        }

        s.applied.push(transaction);
        Ok(())
    }
}
