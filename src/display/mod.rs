//! Display Backend Interface
//!
//! The console core only speaks rectangles, bitmaps and color indices. A
//! display backend implements those primitives for one pixel surface. Each
//! primitive beyond the surface description is optional: a backend reports
//! what it implements through [`Capabilities`], and the console checks that
//! set once when it attaches instead of probing on every call.
//!
//! Two backends live in-tree: [`MemoryFramebuffer`], a software pixel store,
//! and [`Recorder`], a decorator that logs every device call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ColorMap, Point, Rect};

mod memory;
mod recording;

pub use memory::MemoryFramebuffer;
pub use recording::{DrawCall, Recorder};

/// Surface color model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visual {
    /// One bit per pixel, black and white
    Mono,
    /// Pixels are indices into a programmable color map
    PseudoColor,
    /// Pixels are packed RGB values with fixed channel ramps
    TrueColor,
    /// Pixels are packed RGB values with programmable channel ramps
    DirectColor,
}

impl Visual {
    /// Whether pixel values are palette indices
    pub fn is_indexed(self) -> bool {
        matches!(self, Visual::Mono | Visual::PseudoColor)
    }
}

/// Description of a display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    /// Device identification string
    pub id: String,
    /// Width in pixels
    pub xres: u32,
    /// Height in pixels
    pub yres: u32,
    /// Bits per pixel
    pub bits_per_pixel: u8,
    /// Color model
    pub visual: Visual,
    /// Whether drawing primitives are hardware accelerated
    pub accelerated: bool,
}

impl SurfaceInfo {
    /// Number of color map slots the console programs
    pub fn color_table_len(&self) -> usize {
        if self.bits_per_pixel <= 4 {
            1 << self.bits_per_pixel
        } else {
            16
        }
    }

    pub fn can_do_color(&self) -> bool {
        self.bits_per_pixel != 1
    }
}

bitflags::bitflags! {
    /// Optional primitives a backend implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u32 {
        /// Solid rectangle fill.
        const FILL_RECT     = 1 << 0;
        /// Rectangle copy within the surface.
        const COPY_AREA     = 1 << 1;
        /// Bitmap blit with foreground/background expansion.
        const IMAGE_BLIT    = 1 << 2;
        /// Hardware cursor.
        const HW_CURSOR     = 1 << 3;
        /// Programmable color map.
        const SET_COLOR_MAP = 1 << 4;
        /// Native blanking.
        const BLANK         = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Which fields of a [`HwCursor`] update changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CursorChange: u8 {
        /// Enable flag.
        const ENABLE   = 1 << 0;
        /// Position.
        const POSITION = 1 << 1;
        /// Size.
        const SIZE     = 1 << 2;
        /// Scanline band.
        const SHAPE    = 1 << 3;
    }
}

/// Raster operation for fills
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterOp {
    /// Replace destination pixels
    #[default]
    Copy,
    /// XOR the color into destination pixels
    Xor,
}

/// Blanking levels, from unblanked to powered down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlankMode {
    Unblank,
    Normal,
    VsyncSuspend,
    HsyncSuspend,
    Powerdown,
}

impl BlankMode {
    pub fn is_blanking(self) -> bool {
        self != BlankMode::Unblank
    }
}

/// A bitmap to draw onto the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image<'a> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Source bits per pixel; console glyphs are always 1
    pub depth: u8,
    /// Native color for set bits
    pub fg_color: u32,
    /// Native color for clear bits
    pub bg_color: u32,
    /// Rows of `ceil(width * depth / 8)` bytes, MSB first
    pub data: &'a [u8],
}

/// Visible scanline band of the cursor within its cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanlineBand {
    /// First visible scanline, from the top of the cell
    pub top: u32,
    /// One past the last visible scanline
    pub bottom: u32,
}

impl ScanlineBand {
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Hardware cursor update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwCursor {
    /// Fields that changed since the previous update
    pub set: CursorChange,
    pub enable: bool,
    /// Top-left pixel of the cursor cell
    pub pos: Point,
    /// Cell size in pixels
    pub size: Point,
    /// Visible band within the cell
    pub band: ScanlineBand,
}

/// Per-surface table turning palette indices into native pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoPalette<'a> {
    /// Indexed surfaces have no pseudo-palette
    None,
    /// Native values of surfaces up to 16 bits per pixel
    Narrow(&'a [u16]),
    /// Native values of deeper surfaces
    Wide(&'a [u32]),
}

/// Errors reported by fallible backend hooks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("device busy")]
    Busy,

    #[error("operation not supported by device")]
    Unsupported,

    #[error("color map of {len} slots rejected: {reason}")]
    ColorMap { len: usize, reason: String },

    #[error("device error: {0}")]
    Device(String),
}

/// A pixel display the console renders into.
///
/// Optional primitives have empty default bodies; the console only calls
/// the ones named in [`capabilities`](Self::capabilities). All calls are
/// synchronous and coordinates are always within the surface.
pub trait DisplayBackend {
    /// Describe the surface
    fn info(&self) -> SurfaceInfo;

    /// Optional primitives this backend implements
    fn capabilities(&self) -> Capabilities;

    /// Current pseudo-palette. Read on every color resolution, never cached.
    fn pseudo_palette(&self) -> PseudoPalette<'_> {
        PseudoPalette::None
    }

    /// Called once when a console attaches
    fn open(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Apply the current video mode
    fn set_par(&mut self) {}

    fn fill_rect(&mut self, _rect: Rect, _color: u32, _rop: RasterOp) {}

    /// Copy `src` so that its top-left lands on `dst`; regions may overlap
    fn copy_area(&mut self, _src: Rect, _dst: Point) {}

    fn image_blit(&mut self, _image: &Image<'_>) {}

    fn set_cursor(&mut self, _cursor: &HwCursor) {}

    fn set_color_map(&mut self, _cmap: &ColorMap) -> Result<(), BackendError> {
        Err(BackendError::Unsupported)
    }

    fn blank(&mut self, _mode: BlankMode) {}
}

/// A backend shared between the console and other users of the device
pub type SharedDisplay<B> = Arc<Mutex<B>>;

/// Lock a mutex, recovering the guard if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of attached display devices, most recent last
#[derive(Debug)]
pub struct DisplayRegistry<B> {
    displays: Vec<SharedDisplay<B>>,
}

impl<B> Default for DisplayRegistry<B> {
    fn default() -> Self {
        Self {
            displays: Vec::new(),
        }
    }
}

impl<B: DisplayBackend> DisplayRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and return its shared handle
    pub fn register(&mut self, backend: B) -> SharedDisplay<B> {
        let display = Arc::new(Mutex::new(backend));
        self.displays.push(Arc::clone(&display));
        display
    }

    /// Drop a device from the registry
    pub fn unregister(&mut self, display: &SharedDisplay<B>) -> bool {
        let before = self.displays.len();
        self.displays.retain(|d| !Arc::ptr_eq(d, display));
        self.displays.len() != before
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    /// The most recently registered device
    pub fn latest(&self) -> Option<SharedDisplay<B>> {
        self.displays.last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_len() {
        let mut info = SurfaceInfo {
            id: "test".to_string(),
            xres: 640,
            yres: 480,
            bits_per_pixel: 1,
            visual: Visual::Mono,
            accelerated: false,
        };
        assert_eq!(info.color_table_len(), 2);
        assert!(!info.can_do_color());

        info.bits_per_pixel = 4;
        assert_eq!(info.color_table_len(), 16);

        info.bits_per_pixel = 8;
        assert_eq!(info.color_table_len(), 16);

        info.bits_per_pixel = 32;
        assert_eq!(info.color_table_len(), 16);
        assert!(info.can_do_color());
    }

    #[test]
    fn test_scanline_band_height() {
        let band = ScanlineBand { top: 13, bottom: 15 };
        assert_eq!(band.height(), 2);
        assert_eq!(ScanlineBand { top: 15, bottom: 15 }.height(), 0);
    }

    #[test]
    fn test_registry_latest() {
        let mut displays = DisplayRegistry::new();
        assert!(displays.is_empty());
        assert!(displays.latest().is_none());

        let first = displays.register(MemoryFramebuffer::new(320, 200, 8, Visual::PseudoColor));
        let second = displays.register(MemoryFramebuffer::new(640, 480, 32, Visual::TrueColor));
        assert_eq!(displays.len(), 2);
        assert!(Arc::ptr_eq(&displays.latest().unwrap(), &second));

        assert!(displays.unregister(&second));
        assert!(Arc::ptr_eq(&displays.latest().unwrap(), &first));
        assert!(!displays.unregister(&second));
    }
}
