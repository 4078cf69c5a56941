//! Software framebuffer
//!
//! A display backend that keeps its pixels in memory. Pixel values are
//! native: palette indices on indexed surfaces, packed RGB on true/direct
//! color surfaces. Used by the headless runner and by tests that need to
//! look at actual pixel output.

use crate::core::{ColorMap, Point, Rect};

use super::{
    BackendError, BlankMode, Capabilities, DisplayBackend, HwCursor, Image, PseudoPalette,
    RasterOp, SurfaceInfo, Visual,
};

/// Slots in the pseudo-palette of packed-pixel surfaces
const PSEUDO_PALETTE_LEN: usize = 16;

#[derive(Debug, Clone)]
enum PseudoStore {
    None,
    Narrow(Vec<u16>),
    Wide(Vec<u32>),
}

/// In-memory pixel surface
#[derive(Debug, Clone)]
pub struct MemoryFramebuffer {
    info: SurfaceInfo,
    caps: Capabilities,
    pixels: Vec<u32>,
    cmap: ColorMap,
    pseudo: PseudoStore,
    cursor: Option<HwCursor>,
    blank: BlankMode,
    open_count: u32,
}

impl MemoryFramebuffer {
    /// Create a black surface.
    ///
    /// Every primitive except the hardware cursor is available; use
    /// [`with_capabilities`](Self::with_capabilities) to narrow that down.
    pub fn new(xres: u32, yres: u32, bits_per_pixel: u8, visual: Visual) -> Self {
        let info = SurfaceInfo {
            id: "memfb".to_string(),
            xres,
            yres,
            bits_per_pixel,
            visual,
            accelerated: false,
        };

        let cmap_len = if visual.is_indexed() {
            1usize << bits_per_pixel.min(8)
        } else {
            PSEUDO_PALETTE_LEN
        };
        let cmap = ColorMap::try_default(cmap_len).unwrap_or_default();

        let mut fb = Self {
            info,
            caps: Capabilities::all().difference(Capabilities::HW_CURSOR),
            pixels: vec![0; xres as usize * yres as usize],
            cmap,
            pseudo: PseudoStore::None,
            cursor: None,
            blank: BlankMode::Unblank,
            open_count: 0,
        };
        fb.rebuild_pseudo_palette();
        fb
    }

    /// Restrict or extend the advertised primitives
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Mark the surface as hardware accelerated
    pub fn with_acceleration(mut self, accelerated: bool) -> Self {
        self.info.accelerated = accelerated;
        self
    }

    /// Native pixel value at a position
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    /// Native pixel values of one scanline
    pub fn row(&self, y: u32) -> &[u32] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.info.xres as usize]
    }

    /// Displayed 8-bit RGB color at a position, black while blanked
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.blank.is_blanking() {
            return (0, 0, 0);
        }

        let value = self.pixel(x, y);
        match self.info.visual {
            Visual::Mono => {
                if value & 1 != 0 {
                    (0xff, 0xff, 0xff)
                } else {
                    (0, 0, 0)
                }
            }
            Visual::PseudoColor => self
                .cmap
                .get(value as usize)
                .map(|(r, g, b)| ((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8))
                .unwrap_or((0, 0, 0)),
            Visual::TrueColor | Visual::DirectColor => unpack_rgb(value, self.info.bits_per_pixel),
        }
    }

    /// Current color map
    pub fn color_map(&self) -> &ColorMap {
        &self.cmap
    }

    /// Last hardware cursor update received
    pub fn cursor(&self) -> Option<&HwCursor> {
        self.cursor.as_ref()
    }

    pub fn blank_mode(&self) -> BlankMode {
        self.blank
    }

    /// How many times a console opened the device
    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    /// Render the displayed image as a binary PPM (P6)
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.info.xres, self.info.yres);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for y in 0..self.info.yres {
            for x in 0..self.info.xres {
                let (r, g, b) = self.rgb(x, y);
                out.extend_from_slice(&[r, g, b]);
            }
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.info.xres as usize + x as usize
    }

    fn pixel_mask(&self) -> u32 {
        match self.info.bits_per_pixel {
            bpp if bpp >= 32 => u32::MAX,
            bpp => (1u32 << bpp) - 1,
        }
    }

    /// Packed-pixel surfaces mirror the first color map slots into the
    /// pseudo-palette, the way drivers do when a color register is set.
    fn rebuild_pseudo_palette(&mut self) {
        if self.info.visual.is_indexed() {
            self.pseudo = PseudoStore::None;
            return;
        }

        let bpp = self.info.bits_per_pixel;
        let values = (0..PSEUDO_PALETTE_LEN).map(|slot| {
            self.cmap
                .get(slot)
                .map_or(0, |(r, g, b)| pack_rgb(r, g, b, bpp))
        });
        self.pseudo = if bpp > 16 {
            PseudoStore::Wide(values.collect())
        } else {
            PseudoStore::Narrow(values.map(|v| v as u16).collect())
        };
    }
}

/// Pack 16-bit channels into a native pixel value
fn pack_rgb(r: u16, g: u16, b: u16, bpp: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    match bpp {
        15 => ((r >> 11) << 10) | ((g >> 11) << 5) | (b >> 11),
        16 => ((r >> 11) << 11) | ((g >> 10) << 5) | (b >> 11),
        _ => ((r >> 8) << 16) | ((g >> 8) << 8) | (b >> 8),
    }
}

/// Expand a native pixel value to 8-bit channels
fn unpack_rgb(value: u32, bpp: u8) -> (u8, u8, u8) {
    let scale = |v: u32, bits: u32| ((v * 255) / ((1 << bits) - 1)) as u8;
    match bpp {
        15 => (
            scale((value >> 10) & 0x1f, 5),
            scale((value >> 5) & 0x1f, 5),
            scale(value & 0x1f, 5),
        ),
        16 => (
            scale((value >> 11) & 0x1f, 5),
            scale((value >> 5) & 0x3f, 6),
            scale(value & 0x1f, 5),
        ),
        _ => ((value >> 16) as u8, (value >> 8) as u8, value as u8),
    }
}

impl DisplayBackend for MemoryFramebuffer {
    fn info(&self) -> SurfaceInfo {
        self.info.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn pseudo_palette(&self) -> PseudoPalette<'_> {
        match &self.pseudo {
            PseudoStore::None => PseudoPalette::None,
            PseudoStore::Narrow(table) => PseudoPalette::Narrow(table),
            PseudoStore::Wide(table) => PseudoPalette::Wide(table),
        }
    }

    fn open(&mut self) -> Result<(), BackendError> {
        self.open_count += 1;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: u32, rop: RasterOp) {
        let rect = rect.clip(self.info.xres, self.info.yres);
        let color = color & self.pixel_mask();
        for y in rect.y..rect.y + rect.height {
            let start = self.index(rect.x, y);
            let row = &mut self.pixels[start..start + rect.width as usize];
            match rop {
                RasterOp::Copy => row.fill(color),
                RasterOp::Xor => row.iter_mut().for_each(|p| *p ^= color),
            }
        }
    }

    fn copy_area(&mut self, src: Rect, dst: Point) {
        let (xres, yres) = (self.info.xres, self.info.yres);
        let src = src.clip(xres, yres);
        let dst_rect = Rect::new(dst.x, dst.y, src.width, src.height).clip(xres, yres);
        let (width, height) = (dst_rect.width, dst_rect.height);
        if width == 0 || height == 0 {
            return;
        }

        // Walk rows away from the overlap so no source row is overwritten first.
        let copy_row = |fb: &mut Self, row: u32| {
            let from = fb.index(src.x, src.y + row);
            let to = fb.index(dst.x, dst.y + row);
            fb.pixels.copy_within(from..from + width as usize, to);
        };
        if dst.y > src.y {
            for row in (0..height).rev() {
                copy_row(self, row);
            }
        } else {
            for row in 0..height {
                copy_row(self, row);
            }
        }
    }

    fn image_blit(&mut self, image: &Image<'_>) {
        if image.depth != 1 {
            tracing::debug!("memfb: ignoring {}-bit image", image.depth);
            return;
        }

        let mask = self.pixel_mask();
        let pitch = image.width.div_ceil(8) as usize;
        for dy in 0..image.height {
            let y = image.y + dy;
            if y >= self.info.yres {
                break;
            }
            let line = &image.data[dy as usize * pitch..][..pitch];
            for dx in 0..image.width {
                let x = image.x + dx;
                if x >= self.info.xres {
                    break;
                }
                let bit = (line[dx as usize / 8] >> (7 - dx % 8)) & 1;
                let color = if bit != 0 {
                    image.fg_color
                } else {
                    image.bg_color
                };
                let index = self.index(x, y);
                self.pixels[index] = color & mask;
            }
        }
    }

    fn set_cursor(&mut self, cursor: &HwCursor) {
        self.cursor = Some(*cursor);
    }

    fn set_color_map(&mut self, cmap: &ColorMap) -> Result<(), BackendError> {
        let start = cmap.start as usize;
        if start + cmap.len() > self.cmap.len() {
            return Err(BackendError::ColorMap {
                len: cmap.len(),
                reason: format!("device holds {} slots", self.cmap.len()),
            });
        }

        for (offset, (r, g, b)) in cmap.entries().enumerate() {
            self.cmap.set(start + offset, r, g, b);
        }
        self.rebuild_pseudo_palette();
        Ok(())
    }

    fn blank(&mut self, mode: BlankMode) {
        self.blank = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_xor() {
        let mut fb = MemoryFramebuffer::new(16, 8, 8, Visual::PseudoColor);
        fb.fill_rect(Rect::new(2, 2, 4, 3), 5, RasterOp::Copy);
        assert_eq!(fb.pixel(2, 2), 5);
        assert_eq!(fb.pixel(5, 4), 5);
        assert_eq!(fb.pixel(6, 4), 0);

        fb.fill_rect(Rect::new(2, 2, 1, 1), 0x0f, RasterOp::Xor);
        assert_eq!(fb.pixel(2, 2), 5 ^ 0x0f);
        fb.fill_rect(Rect::new(2, 2, 1, 1), 0x0f, RasterOp::Xor);
        assert_eq!(fb.pixel(2, 2), 5);
    }

    #[test]
    fn test_fill_clips_to_surface() {
        let mut fb = MemoryFramebuffer::new(8, 8, 8, Visual::PseudoColor);
        fb.fill_rect(Rect::new(4, 4, 100, 100), 1, RasterOp::Copy);
        assert_eq!(fb.pixel(7, 7), 1);
        assert_eq!(fb.pixel(3, 3), 0);
    }

    #[test]
    fn test_overlapping_copy_down() {
        let mut fb = MemoryFramebuffer::new(4, 6, 8, Visual::PseudoColor);
        for y in 0..6 {
            fb.fill_rect(Rect::new(0, y, 4, 1), y + 1, RasterOp::Copy);
        }
        fb.copy_area(Rect::new(0, 0, 4, 4), Point::new(0, 2));
        let column: Vec<u32> = (0..6).map(|y| fb.pixel(0, y)).collect();
        assert_eq!(column, vec![1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn test_overlapping_copy_up() {
        let mut fb = MemoryFramebuffer::new(4, 6, 8, Visual::PseudoColor);
        for y in 0..6 {
            fb.fill_rect(Rect::new(0, y, 4, 1), y + 1, RasterOp::Copy);
        }
        fb.copy_area(Rect::new(0, 2, 4, 4), Point::new(0, 0));
        let column: Vec<u32> = (0..6).map(|y| fb.pixel(0, y)).collect();
        assert_eq!(column, vec![3, 4, 5, 6, 5, 6]);
    }

    #[test]
    fn test_overlapping_copy_sideways() {
        let mut fb = MemoryFramebuffer::new(6, 1, 8, Visual::PseudoColor);
        for x in 0..6 {
            fb.fill_rect(Rect::new(x, 0, 1, 1), x + 1, RasterOp::Copy);
        }
        fb.copy_area(Rect::new(0, 0, 4, 1), Point::new(2, 0));
        assert_eq!(fb.row(0), &[1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn test_blit_one_bit_image() {
        let mut fb = MemoryFramebuffer::new(8, 2, 8, Visual::PseudoColor);
        let data = [0b1010_0000, 0b0000_0001];
        fb.image_blit(&Image {
            x: 0,
            y: 0,
            width: 8,
            height: 2,
            depth: 1,
            fg_color: 7,
            bg_color: 1,
            data: &data,
        });
        assert_eq!(fb.row(0), &[7, 1, 7, 1, 1, 1, 1, 1]);
        assert_eq!(fb.row(1), &[1, 1, 1, 1, 1, 1, 1, 7]);
    }

    #[test]
    fn test_true_color_pseudo_palette_follows_color_map() {
        let mut fb = MemoryFramebuffer::new(4, 4, 32, Visual::TrueColor);
        match fb.pseudo_palette() {
            PseudoPalette::Wide(table) => assert_eq!(table[1], 0x00aa_0000),
            other => panic!("unexpected pseudo-palette {other:?}"),
        }

        let mut cmap = ColorMap::try_with_len(2).unwrap();
        cmap.set(1, 0x1212, 0x3434, 0x5656);
        fb.set_color_map(&cmap).unwrap();
        match fb.pseudo_palette() {
            PseudoPalette::Wide(table) => assert_eq!(table[1], 0x0012_3456),
            other => panic!("unexpected pseudo-palette {other:?}"),
        }
    }

    #[test]
    fn test_rgb565_pseudo_palette() {
        let fb = MemoryFramebuffer::new(4, 4, 16, Visual::TrueColor);
        match fb.pseudo_palette() {
            PseudoPalette::Narrow(table) => {
                assert_eq!(table[15], 0xffff);
                assert_eq!(table[0], 0);
            }
            other => panic!("unexpected pseudo-palette {other:?}"),
        }
    }

    #[test]
    fn test_color_map_bounds() {
        let mut fb = MemoryFramebuffer::new(4, 4, 4, Visual::PseudoColor);
        let cmap = ColorMap::try_with_len(32).unwrap();
        assert!(matches!(
            fb.set_color_map(&cmap),
            Err(BackendError::ColorMap { len: 32, .. })
        ));
    }

    #[test]
    fn test_ppm_output() {
        let mut fb = MemoryFramebuffer::new(2, 1, 8, Visual::PseudoColor);
        fb.fill_rect(Rect::new(1, 0, 1, 1), 15, RasterOp::Copy);
        let ppm = fb.to_ppm();
        let header = b"P6\n2 1\n255\n";
        assert_eq!(&ppm[..header.len()], header);
        assert_eq!(&ppm[header.len()..], &[0, 0, 0, 0xff, 0xff, 0xff]);
    }
}
