//! Rendering Module
//!
//! Stateless translation of cell-grid operations into device calls:
//! color resolution, glyph blits and block fills/copies.

mod color;
mod glyph;
mod region;

pub use color::{ColorResolver, ColorRole};
pub use glyph::GlyphRenderer;
pub use region::{RegionOps, ScrollDirection};
