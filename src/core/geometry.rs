//! Console geometry
//!
//! Translates character-grid coordinates into pixel coordinates using the
//! active font's cell size. The grid is derived from the surface resolution
//! and is never stored independently of it: whenever the font or the surface
//! changes, callers build a fresh [`ConsoleGeometry`].

use serde::{Deserialize, Serialize};

/// A pixel position on the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A pixel rectangle on the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left corner
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Clip the rectangle to a `width` x `height` surface.
    ///
    /// A rectangle that starts outside the surface clips to an empty one.
    pub fn clip(&self, width: u32, height: u32) -> Rect {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Rect {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    /// Check whether the rectangle lies entirely within a `width` x `height` surface
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x
            .checked_add(self.width)
            .is_some_and(|right| right <= width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}

/// Grid dimensions and cell metrics of a console on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleGeometry {
    /// Surface width in pixels
    pub xres: u32,
    /// Surface height in pixels
    pub yres: u32,
    /// Font cell width in pixels
    pub cell_width: u32,
    /// Font cell height in pixels
    pub cell_height: u32,
    /// Number of text columns
    pub cols: u32,
    /// Number of text rows
    pub rows: u32,
}

impl ConsoleGeometry {
    /// Derive the grid for a surface and a cell size.
    ///
    /// Cell dimensions must be non-zero; fonts are validated for that when
    /// they are loaded.
    pub fn new(xres: u32, yres: u32, cell_width: u32, cell_height: u32) -> Self {
        debug_assert!(cell_width > 0 && cell_height > 0);
        Self {
            xres,
            yres,
            cell_width,
            cell_height,
            cols: xres / cell_width,
            rows: yres / cell_height,
        }
    }

    /// Pixel position of the top-left corner of a cell
    pub fn cell_to_pixel(&self, row: u32, col: u32) -> Point {
        Point::new(col * self.cell_width, row * self.cell_height)
    }

    /// Pixel size (width, height) of a block of cells
    pub fn cell_extent_to_pixel(&self, rows: u32, cols: u32) -> (u32, u32) {
        (cols * self.cell_width, rows * self.cell_height)
    }

    /// Cell (row, col) containing a pixel
    pub fn pixel_to_cell(&self, point: Point) -> (u32, u32) {
        (point.y / self.cell_height, point.x / self.cell_width)
    }

    /// Pixel rectangle covering a block of cells
    pub fn cell_rect(&self, row: u32, col: u32, rows: u32, cols: u32) -> Rect {
        let origin = self.cell_to_pixel(row, col);
        let (width, height) = self.cell_extent_to_pixel(rows, cols);
        Rect::new(origin.x, origin.y, width, height)
    }

    /// Clamp a cell position to the grid
    pub fn clamp_cell(&self, row: u32, col: u32) -> (u32, u32) {
        (
            row.min(self.rows.saturating_sub(1)),
            col.min(self.cols.saturating_sub(1)),
        )
    }

    /// Pixel size of the text area (the rest of the surface is dead border)
    pub fn text_area(&self) -> (u32, u32) {
        self.cell_extent_to_pixel(self.rows, self.cols)
    }
}
