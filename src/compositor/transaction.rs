use crate::compositor::Compositor;
use crate::surface::{ControlHandle, SurfaceSize};

/// A single surface-control mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    /// Move `control` under `parent`, or detach it from the tree when `parent` is `None`.
    Reparent {
        control: ControlHandle,
        parent: Option<ControlHandle>,
    },
    /// Show or hide `control`.
    SetVisibility { control: ControlHandle, visible: bool },
    /// Resize the buffer of `control`.
    SetBufferSize { control: ControlHandle, size: SurfaceSize },
}

impl SurfaceOp {
    /// The control this operation mutates.
    pub fn control(&self) -> ControlHandle {
        match self {
            SurfaceOp::Reparent { control, .. }
            | SurfaceOp::SetVisibility { control, .. }
            | SurfaceOp::SetBufferSize { control, .. } => *control,
        }
    }
}

/// A batch of surface-control mutations that become visible together.
///
/// ```
/// use surface_host::compositor::{SurfaceOp, Transaction};
/// use surface_host::surface::{ControlHandle, SurfaceSize};
///
/// let control = ControlHandle::new();
/// let parent = ControlHandle::new();
///
/// let mut tx = Transaction::new();
/// tx.reparent(control, Some(parent))
///     .set_visibility(control, true)
///     .set_buffer_size(control, SurfaceSize::new(640, 480));
///
/// assert_eq!(tx.len(), 3);
/// assert!(matches!(tx.ops()[0], SurfaceOp::Reparent { .. }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<SurfaceOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reparent(&mut self, control: ControlHandle, parent: Option<ControlHandle>) -> &mut Self {
        self.ops.push(SurfaceOp::Reparent { control, parent });
        self
    }

    pub fn set_visibility(&mut self, control: ControlHandle, visible: bool) -> &mut Self {
        self.ops.push(SurfaceOp::SetVisibility { control, visible });
        self
    }

    pub fn set_buffer_size(&mut self, control: ControlHandle, size: SurfaceSize) -> &mut Self {
        self.ops.push(SurfaceOp::SetBufferSize { control, size });
        self
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if the batch contains a reparent operation.
    pub fn reparents(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, SurfaceOp::Reparent { .. }))
    }

    /// True if the batch contains a buffer resize.
    pub fn resizes(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, SurfaceOp::SetBufferSize { .. }))
    }

    /// Hands the batch to the compositor. Consumes the transaction so it cannot be applied twice.
    pub fn apply(self, compositor: &dyn Compositor) -> anyhow::Result<()> {
        compositor.apply(self)
    }
}
