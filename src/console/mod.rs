//! Frame buffer console
//!
//! [`FbConsole`] attaches a text console to a display backend and turns
//! console events (put characters, clear, scroll, move the cursor, blank,
//! load a palette) into backend draw calls. The operations a console
//! driver offers are collected in the [`ConsoleSwitch`] trait.
//!
//! Capabilities are read once at startup. A missing primitive turns the
//! operations that need it into logged no-ops.

mod blink;
mod cursor;
mod error;
mod vc;

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::app::Config;
use crate::core::{widen_channel, ColorMap, ConsoleGeometry, Font, FontRegistry, Rect, ScreenWord};
use crate::display::{
    lock, BlankMode, Capabilities, DisplayBackend, DisplayRegistry, RasterOp, SharedDisplay,
    SurfaceInfo, Visual,
};
use crate::render::{ColorResolver, ColorRole, GlyphRenderer, RegionOps, ScrollDirection};

pub use blink::CursorBlinker;
pub use cursor::{
    CursorController, CursorEffect, CursorMode, CursorRender, CursorShape, CursorState,
};
pub use error::{ConsoleError, StartupError};
pub use vc::VirtualConsole;

/// Font requests from the text model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOp {
    /// Load a new font
    Set {
        width: u32,
        height: u32,
        glyph_count: usize,
        data: Vec<u8>,
    },
    /// Read back the current font
    Get,
    /// Switch to a registered font, or the default one
    SetDefault { name: Option<String> },
    /// Use the font of another console
    Copy { console: usize },
}

impl FontOp {
    pub fn name(&self) -> &'static str {
        match self {
            FontOp::Set { .. } => "set",
            FontOp::Get => "get",
            FontOp::SetDefault { .. } => "set_default",
            FontOp::Copy { .. } => "copy",
        }
    }
}

/// Operations a console driver provides to the text model
pub trait ConsoleSwitch {
    /// Human readable driver description
    fn description(&self) -> &str;

    /// Reset the derived attribute masks of a console
    fn init(&mut self, vc: &mut VirtualConsole);

    /// Release per-console state
    fn deinit(&mut self, vc: &mut VirtualConsole);

    /// Fill a block of cells with the erase character's background
    fn clear(&mut self, vc: &VirtualConsole, row: u32, col: u32, rows: u32, cols: u32);

    fn putc(&mut self, word: ScreenWord, row: u32, col: u32);

    fn putcs(&mut self, words: &[ScreenWord], row: u32, col: u32);

    fn cursor(&mut self, vc: &VirtualConsole, mode: CursorMode);

    fn scroll_region(&mut self, top: u32, bottom: u32, direction: ScrollDirection, count: u32);

    /// Move a block of cells
    #[allow(clippy::too_many_arguments)]
    fn bmove(
        &mut self,
        src_row: u32,
        src_col: u32,
        dst_row: u32,
        dst_col: u32,
        rows: u32,
        cols: u32,
    );

    fn blank(&mut self, mode: BlankMode);

    fn font_op(&mut self, vc: &mut VirtualConsole, op: &FontOp) -> Result<(), ConsoleError>;

    fn resize(&mut self, vc: &mut VirtualConsole, rows: u32, cols: u32)
        -> Result<(), ConsoleError>;

    /// Program the device color map from the console palette.
    ///
    /// `table[i]` names the device slot that receives palette entry `i`.
    fn set_palette(&mut self, vc: &VirtualConsole, table: &[u8]) -> Result<(), ConsoleError>;
}

/// Draws cursor effects onto the device
#[derive(Debug, Clone, Copy)]
pub(crate) struct CursorPainter {
    resolver: ColorResolver,
    /// Palette index XORed into the surface by the software cursor
    xor_index: u8,
}

impl CursorPainter {
    fn new(info: &SurfaceInfo) -> Self {
        Self {
            resolver: ColorResolver::new(info),
            xor_index: (info.color_table_len().min(16) - 1) as u8,
        }
    }

    /// Issue the device calls for `effect`; returns true if any were made
    pub(crate) fn paint<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        effect: CursorEffect,
    ) -> bool {
        match effect {
            CursorEffect::None => false,
            CursorEffect::Hardware(cursor) => {
                backend.set_cursor(&cursor);
                true
            }
            CursorEffect::Software { erase, draw } => {
                let color = self
                    .resolver
                    .resolve_index(backend.pseudo_palette(), self.xor_index);
                for rect in [erase, draw].into_iter().flatten() {
                    backend.fill_rect(rect, color, RasterOp::Xor);
                }
                true
            }
        }
    }
}

/// Cursor state shared with [`CursorBlinker`] handles
#[derive(Debug)]
pub(crate) struct CursorSlot {
    pub(crate) controller: CursorController,
    pub(crate) painter: CursorPainter,
}

/// A console attached to one display backend
pub struct FbConsole<B: DisplayBackend> {
    display: SharedDisplay<B>,
    font: Arc<Font>,
    geometry: ConsoleGeometry,
    resolver: ColorResolver,
    caps: Capabilities,
    visual: Visual,
    accelerated: bool,
    color_table_len: usize,
    cursor: Arc<Mutex<CursorSlot>>,
    /// Last color map pushed to the device
    installed_cmap: Option<ColorMap>,
    /// The device color map is currently zeroed for blanking
    cmap_blanked: bool,
}

impl<B: DisplayBackend> std::fmt::Debug for FbConsole<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbConsole")
            .field("font", &self.font.name())
            .field("geometry", &self.geometry)
            .field("caps", &self.caps)
            .field("visual", &self.visual)
            .finish_non_exhaustive()
    }
}

impl<B: DisplayBackend> FbConsole<B> {
    pub const DESCRIPTION: &'static str = "frame buffer device";

    /// Attach to the most recently registered display.
    ///
    /// Selects a font for the surface, pushes the default color map and
    /// writes the resulting grid size and attribute masks into `vc`.
    pub fn startup(
        displays: &DisplayRegistry<B>,
        fonts: &FontRegistry,
        config: &Config,
        vc: &mut VirtualConsole,
    ) -> Result<Self, StartupError> {
        let display = displays.latest().ok_or(StartupError::Unavailable)?;
        Self::with_display(display, fonts, config, vc)
    }

    /// Attach to a specific display
    pub fn with_display(
        display: SharedDisplay<B>,
        fonts: &FontRegistry,
        config: &Config,
        vc: &mut VirtualConsole,
    ) -> Result<Self, StartupError> {
        let mut backend = lock(&display);
        if let Err(err) = backend.open() {
            warn!("display open hook failed: {}", err);
        }

        let info = backend.info();
        let font = select_font(fonts, config, &info)?;
        if font.width() % 8 != 0 {
            warn!(
                "font {} is {} pixels wide, blits will carry row padding",
                font.name(),
                font.width()
            );
        }

        backend.set_par();
        let caps = backend.capabilities();
        let color_table_len = info.color_table_len();
        let cmap = ColorMap::try_default(color_table_len)?;
        let installed_cmap = if caps.contains(Capabilities::SET_COLOR_MAP) {
            backend
                .set_color_map(&cmap)
                .map_err(StartupError::ColorMap)?;
            Some(cmap)
        } else {
            debug!("device has a fixed color map");
            None
        };
        drop(backend);

        let geometry = ConsoleGeometry::new(info.xres, info.yres, font.width(), font.height());
        let render = if caps.contains(Capabilities::HW_CURSOR) {
            CursorRender::Hardware
        } else if caps.contains(Capabilities::FILL_RECT) {
            CursorRender::Software
        } else {
            debug!("device can neither draw nor fill a cursor");
            CursorRender::Unavailable
        };
        let cursor = CursorSlot {
            controller: CursorController::new(render, geometry, config.cursor_blink_rate),
            painter: CursorPainter::new(&info),
        };

        let mut console = Self {
            display,
            font,
            geometry,
            resolver: ColorResolver::new(&info),
            caps,
            visual: info.visual,
            accelerated: info.accelerated,
            color_table_len,
            cursor: Arc::new(Mutex::new(cursor)),
            installed_cmap,
            cmap_blanked: false,
        };

        vc.cols = geometry.cols;
        vc.rows = geometry.rows;
        (vc.y, vc.x) = geometry.clamp_cell(vc.y, vc.x);
        vc.can_do_color = info.can_do_color();
        vc.underline_color = config.underline_color;
        vc.hi_font_mask = if console.font.has_high_glyphs() { 0x100 } else { 0 };
        console.init(vc);

        info!(
            "Console: {} {} {}x{}",
            if vc.can_do_color { "colour" } else { "mono" },
            Self::DESCRIPTION,
            geometry.cols,
            geometry.rows
        );
        Ok(console)
    }

    pub fn geometry(&self) -> ConsoleGeometry {
        self.geometry
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn display(&self) -> &SharedDisplay<B> {
        &self.display
    }

    /// Run `f` with the display locked
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let mut backend = lock(&self.display);
        f(&mut backend)
    }

    /// Color map last pushed to the device, if the device takes one
    pub fn installed_color_map(&self) -> Option<&ColorMap> {
        self.installed_cmap.as_ref()
    }

    pub fn cursor_state(&self) -> CursorState {
        lock(&self.cursor).controller.state()
    }

    /// A handle for driving cursor blinking from a timer
    pub fn blinker(&self) -> CursorBlinker<B> {
        CursorBlinker::new(Arc::clone(&self.display), Arc::clone(&self.cursor))
    }

    /// Re-read the surface and recompute the grid.
    ///
    /// Call after the display mode changed. The caller redraws the screen.
    pub fn refresh_geometry(&mut self, vc: &mut VirtualConsole) -> ConsoleGeometry {
        let info = lock(&self.display).info();
        self.geometry =
            ConsoleGeometry::new(info.xres, info.yres, self.font.width(), self.font.height());
        self.resolver = ColorResolver::new(&info);

        let mut slot = lock(&self.cursor);
        slot.controller.set_geometry(self.geometry);
        slot.painter = CursorPainter::new(&info);
        drop(slot);

        vc.cols = self.geometry.cols;
        vc.rows = self.geometry.rows;
        (vc.y, vc.x) = self.geometry.clamp_cell(vc.y, vc.x);
        debug!(
            "geometry now {}x{} cells",
            self.geometry.cols, self.geometry.rows
        );
        self.geometry
    }

    fn regions(&self) -> RegionOps<'_> {
        RegionOps::new(&self.geometry, self.caps)
    }

    fn push_color_map(&self, cmap: &ColorMap) {
        if let Err(err) = lock(&self.display).set_color_map(cmap) {
            warn!("device rejected color map: {}", err);
        }
    }
}

fn select_font(
    fonts: &FontRegistry,
    config: &Config,
    info: &SurfaceInfo,
) -> Result<Arc<Font>, StartupError> {
    let fits = |font: &Arc<Font>| font.width() <= info.xres && font.height() <= info.yres;

    if let Some(name) = config.font.as_deref() {
        match fonts.find(name) {
            Some(font) if fits(&font) => return Ok(font),
            Some(_) => warn!("font {} does not fit the surface, using default", name),
            None => warn!("font {} not found, using default", name),
        }
    }
    fonts
        .default_for(info.xres, info.yres)
        .ok_or(StartupError::NoFont {
            xres: info.xres,
            yres: info.yres,
        })
}

impl<B: DisplayBackend> ConsoleSwitch for FbConsole<B> {
    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn init(&mut self, vc: &mut VirtualConsole) {
        vc.complement_mask = if vc.can_do_color { 0x7700 } else { 0x0800 };
        if vc.hi_font_mask != 0 {
            vc.complement_mask <<= 1;
        }
    }

    fn deinit(&mut self, _vc: &mut VirtualConsole) {
        debug!("console detached");
    }

    fn clear(&mut self, vc: &VirtualConsole, row: u32, col: u32, rows: u32, cols: u32) {
        let mut backend = lock(&self.display);
        let color = self.resolver.resolve(
            backend.pseudo_palette(),
            vc.erase_attr(),
            ColorRole::Background,
        );
        self.regions()
            .clear(&mut *backend, row, col, rows, cols, color);
    }

    fn putc(&mut self, word: ScreenWord, row: u32, col: u32) {
        self.putcs(std::slice::from_ref(&word), row, col);
    }

    fn putcs(&mut self, words: &[ScreenWord], row: u32, col: u32) {
        if !self.caps.contains(Capabilities::IMAGE_BLIT) {
            debug!("putcs skipped: device has no blit primitive");
            return;
        }
        let mut backend = lock(&self.display);
        GlyphRenderer::new(&self.font, &self.geometry, self.resolver)
            .draw_glyphs(&mut *backend, words, row, col);
    }

    fn cursor(&mut self, vc: &VirtualConsole, mode: CursorMode) {
        let mut slot = lock(&self.cursor);
        let effect = slot.controller.request(mode, vc.y, vc.x, vc.cursor_type);
        let mut backend = lock(&self.display);
        slot.painter.paint(&mut *backend, effect);
    }

    fn scroll_region(&mut self, top: u32, bottom: u32, direction: ScrollDirection, count: u32) {
        let mut backend = lock(&self.display);
        self.regions()
            .scroll_region(&mut *backend, top, bottom, direction, count);
    }

    fn bmove(
        &mut self,
        src_row: u32,
        src_col: u32,
        dst_row: u32,
        dst_col: u32,
        rows: u32,
        cols: u32,
    ) {
        let mut backend = lock(&self.display);
        self.regions()
            .move_region(&mut *backend, src_row, src_col, dst_row, dst_col, rows, cols);
    }

    fn blank(&mut self, mode: BlankMode) {
        if self.caps.contains(Capabilities::BLANK) {
            lock(&self.display).blank(mode);
            return;
        }

        if self.accelerated {
            if !mode.is_blanking() {
                return;
            }
            if !self.caps.contains(Capabilities::FILL_RECT) {
                debug!("blank skipped: device has no fill primitive");
                return;
            }
            let rect = Rect::new(0, 0, self.geometry.xres, self.geometry.yres);
            let mut backend = lock(&self.display);
            let black = self
                .resolver
                .resolve_index(backend.pseudo_palette(), 0);
            backend.fill_rect(rect, black, RasterOp::Copy);
            return;
        }

        let programmable = matches!(self.visual, Visual::PseudoColor | Visual::DirectColor);
        if !programmable || !self.caps.contains(Capabilities::SET_COLOR_MAP) {
            debug!("blank skipped: no way to darken a {:?} display", self.visual);
            return;
        }

        if mode.is_blanking() {
            match ColorMap::try_with_len(self.color_table_len) {
                Ok(black) => {
                    self.push_color_map(&black);
                    self.cmap_blanked = true;
                }
                Err(err) => warn!("cannot allocate blank color map: {}", err),
            }
        } else if self.cmap_blanked {
            if let Some(cmap) = &self.installed_cmap {
                self.push_color_map(cmap);
            }
            self.cmap_blanked = false;
        }
    }

    fn font_op(&mut self, _vc: &mut VirtualConsole, op: &FontOp) -> Result<(), ConsoleError> {
        debug!("font operation {} rejected", op.name());
        Err(ConsoleError::Unsupported("font operations"))
    }

    fn resize(
        &mut self,
        _vc: &mut VirtualConsole,
        rows: u32,
        cols: u32,
    ) -> Result<(), ConsoleError> {
        debug!("resize to {}x{} accepted without relayout", cols, rows);
        Ok(())
    }

    fn set_palette(&mut self, vc: &VirtualConsole, table: &[u8]) -> Result<(), ConsoleError> {
        if !self.caps.contains(Capabilities::SET_COLOR_MAP) {
            return Err(ConsoleError::Unsupported("color map"));
        }

        let len = self.color_table_len;
        if table.len() < len {
            return Err(ConsoleError::PaletteTable {
                expected: len,
                actual: table.len(),
            });
        }

        let mut cmap = ColorMap::try_with_len(len)?;
        for (entry, &slot) in table.iter().take(len).enumerate() {
            let slot = slot as usize;
            let (r, g, b) = vc
                .palette_entry(entry)
                .ok_or(ConsoleError::PaletteSlot { slot: entry, len })?;
            if !cmap.set(slot, widen_channel(r), widen_channel(g), widen_channel(b)) {
                return Err(ConsoleError::PaletteSlot { slot, len });
            }
        }

        lock(&self.display).set_color_map(&cmap)?;
        self.installed_cmap = Some(cmap);
        self.cmap_blanked = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DrawCall, MemoryFramebuffer, Recorder};

    fn fonts() -> FontRegistry {
        let mut fonts = FontRegistry::new();
        fonts.register(Font::new("VGA8x16", 8, 16, 256, vec![0xff; 256 * 16]).unwrap());
        fonts.register(Font::new("VGA8x8", 8, 8, 256, vec![0xff; 256 * 8]).unwrap());
        fonts
    }

    fn attach(fb: MemoryFramebuffer) -> (FbConsole<Recorder<MemoryFramebuffer>>, VirtualConsole) {
        let mut displays = DisplayRegistry::new();
        displays.register(Recorder::new(fb));
        let mut vc = VirtualConsole::new();
        let console = FbConsole::startup(&displays, &fonts(), &Config::default(), &mut vc).unwrap();
        console.with_backend(|rec| rec.clear());
        (console, vc)
    }

    #[test]
    fn test_startup_without_display_is_deferred() {
        let displays: DisplayRegistry<MemoryFramebuffer> = DisplayRegistry::new();
        let mut vc = VirtualConsole::new();
        let err = FbConsole::startup(&displays, &fonts(), &Config::default(), &mut vc).unwrap_err();
        assert!(err.is_deferred());
    }

    #[test]
    fn test_startup_prefers_configured_font() {
        let mut displays = DisplayRegistry::new();
        displays.register(MemoryFramebuffer::new(640, 480, 8, Visual::PseudoColor));
        let config = Config {
            font: Some("VGA8x8".to_string()),
            ..Config::default()
        };
        let mut vc = VirtualConsole::new();
        let console = FbConsole::startup(&displays, &fonts(), &config, &mut vc).unwrap();
        assert_eq!(console.font().name(), "VGA8x8");
        assert_eq!((vc.cols, vc.rows), (80, 60));
    }

    #[test]
    fn test_startup_sets_masks() {
        let (_, vc) = attach(MemoryFramebuffer::new(640, 400, 1, Visual::Mono));
        assert!(!vc.can_do_color);
        assert_eq!(vc.complement_mask, 0x0800);
        assert_eq!(vc.hi_font_mask, 0);
    }

    #[test]
    fn test_startup_high_glyph_masks() {
        let mut fonts = FontRegistry::new();
        fonts.register(Font::new("big", 8, 16, 512, vec![0; 512 * 16]).unwrap());
        let mut displays = DisplayRegistry::new();
        displays.register(MemoryFramebuffer::new(640, 400, 8, Visual::PseudoColor));
        let mut vc = VirtualConsole::new();
        FbConsole::startup(&displays, &fonts, &Config::default(), &mut vc).unwrap();
        assert_eq!(vc.hi_font_mask, 0x100);
        assert_eq!(vc.complement_mask, 0x7700 << 1);
    }

    #[test]
    fn test_software_cursor_uses_xor() {
        let (mut console, vc) = attach(MemoryFramebuffer::new(640, 400, 8, Visual::PseudoColor));
        console.cursor(&vc, CursorMode::Draw);
        assert_eq!(console.cursor_state(), CursorState::VisibleSoftware);
        console.with_backend(|rec| {
            assert_eq!(
                rec.calls(),
                &[DrawCall::FillRect {
                    rect: Rect::new(0, 13, 8, 2),
                    color: 15,
                    rop: RasterOp::Xor,
                }]
            );
            assert_eq!(rec.inner().pixel(0, 13), 15);
        });

        console.cursor(&vc, CursorMode::Erase);
        console.with_backend(|rec| assert_eq!(rec.inner().pixel(0, 13), 0));
    }

    #[test]
    fn test_putcs_without_blit_is_silent() {
        let fb = MemoryFramebuffer::new(640, 400, 8, Visual::PseudoColor)
            .with_capabilities(Capabilities::FILL_RECT | Capabilities::COPY_AREA);
        let (mut console, _) = attach(fb);
        console.putcs(&[ScreenWord::default(); 3], 0, 0);
        console.with_backend(|rec| assert!(rec.calls().is_empty()));
    }

    #[test]
    fn test_set_palette_rejects_short_table() {
        let (mut console, vc) = attach(MemoryFramebuffer::new(640, 400, 4, Visual::PseudoColor));
        let err = console.set_palette(&vc, &[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::PaletteTable {
                expected: 16,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_set_palette_rejects_slot_past_map() {
        let (mut console, vc) = attach(MemoryFramebuffer::new(640, 400, 4, Visual::PseudoColor));
        let mut table: Vec<u8> = (0..16).collect();
        table[3] = 40;
        let err = console.set_palette(&vc, &table).unwrap_err();
        assert!(matches!(err, ConsoleError::PaletteSlot { slot: 40, len: 16 }));
        console.with_backend(|rec| assert!(rec.calls().is_empty()));
    }

    #[test]
    fn test_set_palette_without_color_map() {
        let fb = MemoryFramebuffer::new(640, 400, 32, Visual::TrueColor)
            .with_capabilities(Capabilities::FILL_RECT);
        let (mut console, vc) = attach(fb);
        let table: Vec<u8> = (0..16).collect();
        assert!(matches!(
            console.set_palette(&vc, &table),
            Err(ConsoleError::Unsupported(_))
        ));
    }

    #[test]
    fn test_refresh_geometry_clamps_cursor() {
        let (mut console, mut vc) = attach(MemoryFramebuffer::new(640, 400, 8, Visual::PseudoColor));
        vc.y = 24;
        vc.x = 79;
        let geometry = console.refresh_geometry(&mut vc);
        assert_eq!((geometry.cols, geometry.rows), (80, 25));
        assert_eq!((vc.y, vc.x), (24, 79));
    }
}
