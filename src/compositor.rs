//! OS compositor port.
//!
//! The host platform's compositor owns the display tree. The crate only ever talks to it through
//! [`Compositor`]: creating controls, asking whether a control is still alive, and applying
//! [`Transaction`]s. A transaction is all-or-nothing; a half-applied batch would show a flash of
//! an unparented or wrongly sized surface.

use crate::surface::{ControlHandle, PixelFormat, SurfaceHandle, SurfaceSize};

mod transaction;
pub use transaction::*;

/// Compositor backends.
pub mod backends {
    /// In-process compositor that records every applied transaction
    pub mod recording;
}

/// Core compositor interface. Calls occur on the host UI thread.
pub trait Compositor {
    /// Name of the compositor, for logging.
    fn name(&self) -> &str;

    /// Creates a new, unparented and hidden surface control with a buffer of the given size.
    ///
    /// Returns the control together with the drawable surface derived from it. Both stay valid
    /// for as long as the caller keeps them.
    fn create_control(
        &self,
        name: &str,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> anyhow::Result<(ControlHandle, SurfaceHandle)>;

    /// Returns false once the control has been released by its owner.
    fn is_valid(&self, _control: &ControlHandle) -> bool {
        true
    }

    /// Applies all operations of the transaction atomically. On error nothing has been applied.
    fn apply(&self, transaction: Transaction) -> anyhow::Result<()>;
}
