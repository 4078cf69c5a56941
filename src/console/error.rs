//! Console error types

use std::collections::TryReserveError;

use thiserror::Error;

use crate::display::BackendError;

/// Why a console could not attach to a display
#[derive(Debug, Error)]
pub enum StartupError {
    /// No display is registered yet; try again once one is
    #[error("no display device registered")]
    Unavailable,

    #[error("no font fits a {xres}x{yres} surface")]
    NoFont { xres: u32, yres: u32 },

    #[error("cannot allocate color map: {0}")]
    ColorMapAlloc(#[from] TryReserveError),

    #[error("device rejected the initial color map: {0}")]
    ColorMap(BackendError),
}

impl StartupError {
    /// Whether the failure only defers attachment rather than preventing it
    pub fn is_deferred(&self) -> bool {
        matches!(self, StartupError::Unavailable)
    }
}

/// Errors from console operations
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0} not supported")]
    Unsupported(&'static str),

    #[error("palette slot {slot} outside a color map of {len} slots")]
    PaletteSlot { slot: usize, len: usize },

    #[error("palette table has {actual} entries, need {expected}")]
    PaletteTable { expected: usize, actual: usize },

    #[error("cannot allocate color map: {0}")]
    ColorMapAlloc(#[from] TryReserveError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
