//! Cursor controller
//!
//! Tracks where the cursor is, whether it is shown, which scanline band of
//! the cell it covers and how it is rendered. Every request goes through
//! [`CursorController::request`] or [`CursorController::tick`], which return
//! the device work to do as a [`CursorEffect`]. A request that would leave
//! the rendered position and enable flag unchanged produces no effect:
//! some devices flicker on every cursor update.

use crate::core::{ConsoleGeometry, Point, Rect};
use crate::display::{CursorChange, HwCursor, ScanlineBand};

/// Cursor requests from the text model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Show the cursor at the current cell
    Draw,
    /// Hide the cursor
    Erase,
    /// The cursor cell changed while shown
    Move,
    /// The cursor type changed
    Change,
}

/// Cursor shape, from the low nibble of the console cursor type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorShape {
    #[default]
    Default,
    None,
    Underline,
    LowerThird,
    LowerHalf,
    TwoThirds,
    Block,
}

impl CursorShape {
    pub fn from_cursor_type(cursor_type: u32) -> Self {
        match cursor_type & 0x0f {
            1 => CursorShape::None,
            2 => CursorShape::Underline,
            3 => CursorShape::LowerThird,
            4 => CursorShape::LowerHalf,
            5 => CursorShape::TwoThirds,
            6 => CursorShape::Block,
            _ => CursorShape::Default,
        }
    }

    /// Scanline band covered in a cell `cell_height` pixels tall.
    ///
    /// Cells of 10 or more scanlines keep the last scanline free, except
    /// for the block shape which covers the whole cell.
    pub fn band(self, cell_height: u32) -> ScanlineBand {
        let mut bottom = cell_height;
        if bottom >= 10 {
            bottom -= 1;
        }
        let top = match self {
            CursorShape::None => bottom,
            CursorShape::Block => {
                return ScanlineBand {
                    top: 0,
                    bottom: cell_height,
                }
            }
            CursorShape::TwoThirds => bottom / 3,
            CursorShape::LowerThird => (bottom * 2) / 3,
            CursorShape::LowerHalf => bottom / 2,
            CursorShape::Underline | CursorShape::Default => bottom.saturating_sub(2),
        };
        ScanlineBand { top, bottom }
    }
}

/// How the cursor reaches the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRender {
    /// The device draws and blinks the cursor itself
    Hardware,
    /// The console XORs the band into the surface
    Software,
    /// The device can do neither; state is tracked but nothing is drawn
    Unavailable,
}

/// Observable cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Hidden,
    VisibleSoftware,
    VisibleHardware,
}

/// Device work produced by a cursor transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEffect {
    None,
    /// Send this update to the hardware cursor
    Hardware(HwCursor),
    /// XOR `erase` out, then XOR `draw` in
    Software {
        erase: Option<Rect>,
        draw: Option<Rect>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rendered {
    pos: Point,
    enabled: bool,
}

/// The cursor state machine
#[derive(Debug, Clone)]
pub struct CursorController {
    render: CursorRender,
    geometry: ConsoleGeometry,
    shape: CursorShape,
    band: ScanlineBand,
    /// Pixel position the text model asked for
    pos: Point,
    /// Whether the text model wants the cursor shown
    requested: bool,
    /// Blink phase; the cursor is shown only while on
    blink_on: bool,
    blink_rate: u32,
    ticks: u32,
    /// What the device currently shows
    rendered: Rendered,
    /// Software cursor rectangle currently XORed in
    drawn: Option<Rect>,
}

impl CursorController {
    /// `blink_rate` is the number of ticks per blink phase; 0 disables blinking
    pub fn new(render: CursorRender, geometry: ConsoleGeometry, blink_rate: u32) -> Self {
        let shape = CursorShape::default();
        Self {
            render,
            geometry,
            shape,
            band: shape.band(geometry.cell_height),
            pos: Point::default(),
            requested: false,
            blink_on: true,
            blink_rate,
            ticks: 0,
            rendered: Rendered {
                pos: Point::default(),
                enabled: false,
            },
            drawn: None,
        }
    }

    pub fn render(&self) -> CursorRender {
        self.render
    }

    pub fn shape(&self) -> CursorShape {
        self.shape
    }

    pub fn band(&self) -> ScanlineBand {
        self.band
    }

    /// Pixel position of the cursor cell
    pub fn position(&self) -> Point {
        self.pos
    }

    /// Whether the device currently shows the cursor
    pub fn is_enabled(&self) -> bool {
        self.rendered.enabled
    }

    pub fn state(&self) -> CursorState {
        if !self.rendered.enabled {
            return CursorState::Hidden;
        }
        match self.render {
            CursorRender::Hardware => CursorState::VisibleHardware,
            CursorRender::Software => CursorState::VisibleSoftware,
            CursorRender::Unavailable => CursorState::Hidden,
        }
    }

    /// Adopt a new geometry after a font or resolution change.
    ///
    /// The caller is expected to redraw the screen, so any software cursor
    /// pixels are forgotten rather than erased.
    pub fn set_geometry(&mut self, geometry: ConsoleGeometry) {
        self.geometry = geometry;
        self.band = self.shape.band(geometry.cell_height);
        self.drawn = None;
        self.rendered.enabled = false;
    }

    /// Apply a request for the cursor at cell (`row`, `col`)
    pub fn request(
        &mut self,
        mode: CursorMode,
        row: u32,
        col: u32,
        cursor_type: u32,
    ) -> CursorEffect {
        match mode {
            CursorMode::Erase => {
                self.requested = false;
                self.sync(false)
            }
            CursorMode::Draw | CursorMode::Move => {
                let (row, col) = self.geometry.clamp_cell(row, col);
                self.pos = self.geometry.cell_to_pixel(row, col);
                self.requested = true;
                self.blink_on = true;
                self.ticks = 0;
                self.sync(false)
            }
            CursorMode::Change => {
                self.shape = CursorShape::from_cursor_type(cursor_type);
                self.band = self.shape.band(self.geometry.cell_height);
                if self.rendered.enabled {
                    self.sync(true)
                } else {
                    CursorEffect::None
                }
            }
        }
    }

    /// Advance the blink clock by one tick
    pub fn tick(&mut self) -> CursorEffect {
        if !self.requested || self.blink_rate == 0 {
            return CursorEffect::None;
        }
        self.ticks += 1;
        if self.ticks < self.blink_rate {
            return CursorEffect::None;
        }
        self.ticks = 0;
        self.blink_on = !self.blink_on;
        self.sync(false)
    }

    fn sync(&mut self, reshape: bool) -> CursorEffect {
        let enabled = self.requested && self.blink_on;
        let target = Rendered {
            pos: self.pos,
            enabled,
        };
        if !reshape && target == self.rendered {
            return CursorEffect::None;
        }
        self.rendered = target;

        match self.render {
            CursorRender::Hardware => {
                let set = if enabled {
                    CursorChange::all()
                } else {
                    CursorChange::ENABLE
                };
                CursorEffect::Hardware(HwCursor {
                    set,
                    enable: enabled,
                    pos: self.pos,
                    size: Point::new(self.geometry.cell_width, self.geometry.cell_height),
                    band: self.band,
                })
            }
            CursorRender::Software => {
                let erase = self.drawn.take();
                let draw = if enabled {
                    Some(Rect::new(
                        self.pos.x,
                        self.pos.y + self.band.top,
                        self.geometry.cell_width,
                        self.band.height(),
                    ))
                    .filter(|rect| !rect.is_empty())
                } else {
                    None
                };
                self.drawn = draw;
                if erase.is_none() && draw.is_none() {
                    CursorEffect::None
                } else {
                    CursorEffect::Software { erase, draw }
                }
            }
            CursorRender::Unavailable => CursorEffect::None,
        }
    }
}
