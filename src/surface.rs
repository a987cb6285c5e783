//! Surface handles, sizes and pixel formats.
//!
//! Handles are opaque identities. Two handles are the same surface if and only if they compare
//! equal; the host hands out a fresh handle whenever it creates a new native object, so a
//! destroyed-and-recreated control never shares an identity with its predecessor.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Handle to a compositor surface control (a node in the display tree).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlHandle(Uuid);

impl ControlHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ControlHandle {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for ControlHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "control:{}", self.0)
    }
}

/// Handle to a drawable target (the thing an engine renders into).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(Uuid);

impl SurfaceHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SurfaceHandle {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface:{}", self.0)
    }
}

/// Size of a surface buffer in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Buffer pixel formats, using the host platform's raw format codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    #[default]
    Rgba8888,
    Rgbx8888,
    Rgb888,
    Rgb565,
    /// System chooses an opaque format.
    Opaque,
    /// System chooses a format with many alpha bits.
    Translucent,
    /// System chooses a format with at least one alpha bit.
    Transparent,
    /// Any code not listed above.
    Other(i32),
}

impl PixelFormat {
    /// Maps a raw host format code to a [`PixelFormat`].
    pub fn from_raw(code: i32) -> Self {
        match code {
            1 => PixelFormat::Rgba8888,
            2 => PixelFormat::Rgbx8888,
            3 => PixelFormat::Rgb888,
            4 => PixelFormat::Rgb565,
            -1 => PixelFormat::Opaque,
            -2 => PixelFormat::Transparent,
            -3 => PixelFormat::Translucent,
            other => PixelFormat::Other(other),
        }
    }

    /// Returns the raw host format code.
    pub fn raw(self) -> i32 {
        match self {
            PixelFormat::Rgba8888 => 1,
            PixelFormat::Rgbx8888 => 2,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgb565 => 4,
            PixelFormat::Opaque => -1,
            PixelFormat::Transparent => -2,
            PixelFormat::Translucent => -3,
            PixelFormat::Other(code) => code,
        }
    }

    /// True for formats that describe an actual buffer layout rather than a hint to the system.
    pub fn is_buffer_format(self) -> bool {
        matches!(
            self,
            PixelFormat::Rgba8888 | PixelFormat::Rgbx8888 | PixelFormat::Rgb888 | PixelFormat::Rgb565
        )
    }
}

/// Display metrics of the host's primary display. The default window is sized from these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    pub width_pixels: u32,
    pub height_pixels: u32,
    pub density: f32,
}

impl DisplayMetrics {
    pub fn new(width_pixels: u32, height_pixels: u32) -> Self {
        Self {
            width_pixels,
            height_pixels,
            density: 1.0,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width_pixels, self.height_pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        assert_ne!(ControlHandle::new(), ControlHandle::new());
        assert_ne!(SurfaceHandle::new(), SurfaceHandle::new());

        let c = ControlHandle::new();
        let copy = c;
        assert_eq!(c, copy);
    }

    #[test]
    fn pixel_format_codes() {
        for code in [1, 2, 3, 4, -1, -2, -3, 42] {
            assert_eq!(PixelFormat::from_raw(code).raw(), code);
        }
        assert_eq!(PixelFormat::from_raw(42), PixelFormat::Other(42));
        assert!(PixelFormat::Rgba8888.is_buffer_format());
        assert!(!PixelFormat::Translucent.is_buffer_format());
    }

    #[test]
    fn surface_size_display() {
        assert_eq!(SurfaceSize::new(1080, 2400).to_string(), "1080x2400");
        assert_eq!(DisplayMetrics::new(720, 1280).size(), SurfaceSize::new(720, 1280));
    }
}
