//! Region operations
//!
//! Clear, move and scroll rectangular blocks of the grid as single pixel
//! rectangle fills and copies. The copy primitive handles overlapping
//! source and destination itself.

use crate::core::{ConsoleGeometry, Point, Rect};
use crate::display::{Capabilities, DisplayBackend, RasterOp};

/// Direction of a band scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Content moves towards the top row
    Up,
    /// Content moves towards the bottom row
    Down,
}

/// Block operations for one console geometry
#[derive(Debug, Clone, Copy)]
pub struct RegionOps<'a> {
    geometry: &'a ConsoleGeometry,
    caps: Capabilities,
}

impl<'a> RegionOps<'a> {
    /// `caps` is the capability set the console cached when it attached
    pub fn new(geometry: &'a ConsoleGeometry, caps: Capabilities) -> Self {
        Self { geometry, caps }
    }

    /// Fill a block of cells with a native color.
    ///
    /// The block is one row taller than `rows`, so a request for zero rows
    /// still clears a full cell row. The fill is clipped to the text area,
    /// so the border below the last row is never drawn.
    pub fn clear<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
        color: u32,
    ) {
        if !self.caps.contains(Capabilities::FILL_RECT) {
            tracing::debug!("clear skipped: device has no fill primitive");
            return;
        }

        let (width, height) = self.geometry.text_area();
        let rect = self
            .geometry
            .cell_rect(row, col, rows + 1, cols)
            .clip(width, height);
        if rect.is_empty() {
            return;
        }
        backend.fill_rect(rect, color, RasterOp::Copy);
    }

    /// Copy a block of cells to another cell position
    #[allow(clippy::too_many_arguments)]
    pub fn move_region<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        src_row: u32,
        src_col: u32,
        dst_row: u32,
        dst_col: u32,
        rows: u32,
        cols: u32,
    ) {
        if !self.caps.contains(Capabilities::COPY_AREA) {
            tracing::debug!("move skipped: device has no copy primitive");
            return;
        }

        let src = self.geometry.cell_rect(src_row, src_col, rows, cols);
        if src.is_empty() {
            return;
        }
        let dst = self.geometry.cell_to_pixel(dst_row, dst_col);
        backend.copy_area(src, dst);
    }

    /// Shift the rows `top..bottom` by `count` rows in `direction`.
    ///
    /// The whole scanline width moves as one copy. Rows uncovered by the
    /// shift are left for the caller to clear. A count covering the whole
    /// band copies nothing.
    pub fn scroll_region<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        top: u32,
        bottom: u32,
        direction: ScrollDirection,
        count: u32,
    ) {
        if !self.caps.contains(Capabilities::COPY_AREA) {
            tracing::debug!("scroll skipped: device has no copy primitive");
            return;
        }

        let bottom = bottom.min(self.geometry.rows);
        let band = bottom.saturating_sub(top);
        if count == 0 || count >= band {
            return;
        }

        let cell_height = self.geometry.cell_height;
        let height = (band - count) * cell_height;
        let (src_y, dst_y) = match direction {
            ScrollDirection::Up => ((top + count) * cell_height, top * cell_height),
            ScrollDirection::Down => (top * cell_height, (top + count) * cell_height),
        };

        backend.copy_area(
            Rect::new(0, src_y, self.geometry.xres, height),
            Point::new(0, dst_y),
        );
    }
}
