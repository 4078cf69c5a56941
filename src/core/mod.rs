//! Console Core Module
//!
//! Data the renderer works on. This module contains:
//! - Console geometry (cell grid to pixel translation)
//! - Bitmap fonts and the font registry
//! - Screen words and cell attributes
//! - Device color maps and the default console palette
//!
//! Everything here is plain data with no device access.

mod cell;
mod font;
mod geometry;
mod palette;

pub use cell::{encode_str, CellAttr, ScreenWord, Style};
pub use font::{Font, FontError, FontRegistry, MAX_GLYPH_SIZE};
pub use geometry::{ConsoleGeometry, Point, Rect};
pub use palette::{
    default_console_palette, widen_channel, ColorMap, CONSOLE_COLORS, DEFAULT_PALETTE,
};
