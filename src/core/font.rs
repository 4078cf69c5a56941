//! Console fonts
//!
//! A font is an immutable glyph atlas: one fixed-size 1-bit-per-pixel bitmap
//! per glyph code, rows stored MSB-first with `ceil(width / 8)` bytes per
//! scanline. Bounds are validated once when the font is built, so glyph
//! lookups on the draw path never fail.

use std::sync::Arc;

use thiserror::Error;

/// Font-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    #[error("invalid glyph size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("unsupported glyph count {0} (expected 256 or 512)")]
    GlyphCount(usize),

    #[error("font data holds {actual} bytes, {expected} required")]
    ShortData { expected: usize, actual: usize },
}

/// Largest glyph edge accepted, in pixels
pub const MAX_GLYPH_SIZE: u32 = 32;

/// A bitmap console font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    name: String,
    width: u32,
    height: u32,
    glyph_count: usize,
    /// Selection preference; higher wins in [`FontRegistry::default_for`]
    pref: i32,
    data: Arc<[u8]>,
}

impl Font {
    /// Build a font from raw glyph bitmaps.
    ///
    /// `data` must hold at least `glyph_count * height * ceil(width / 8)`
    /// bytes; trailing bytes are ignored.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        glyph_count: usize,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self, FontError> {
        if !(1..=MAX_GLYPH_SIZE).contains(&width) || !(1..=MAX_GLYPH_SIZE).contains(&height) {
            return Err(FontError::InvalidSize { width, height });
        }
        if glyph_count != 256 && glyph_count != 512 {
            return Err(FontError::GlyphCount(glyph_count));
        }

        let data = data.into();
        let expected = glyph_count * Self::glyph_bytes(width, height);
        if data.len() < expected {
            return Err(FontError::ShortData {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            width,
            height,
            glyph_count,
            pref: 0,
            data,
        })
    }

    /// Set the selection preference used when no font is named explicitly
    pub fn with_pref(mut self, pref: i32) -> Self {
        self.pref = pref;
        self
    }

    fn glyph_bytes(width: u32, height: u32) -> usize {
        height as usize * width.div_ceil(8) as usize
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Cell height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of glyphs (256 or 512)
    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    pub fn pref(&self) -> i32 {
        self.pref
    }

    /// Bytes per glyph scanline
    pub fn pitch(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    /// Mask applied to character codes before glyph lookup
    pub fn char_mask(&self) -> u16 {
        if self.glyph_count > 256 {
            0x1ff
        } else {
            0xff
        }
    }

    /// Whether screen words reserve bit 8 for the glyph code
    pub fn has_high_glyphs(&self) -> bool {
        self.glyph_count > 256
    }

    /// Bitmap of the glyph for `code`, after masking to the glyph range
    pub fn glyph(&self, code: u16) -> &[u8] {
        let size = Self::glyph_bytes(self.width, self.height);
        let offset = (code & self.char_mask()) as usize * size;
        &self.data[offset..offset + size]
    }
}

/// Registry of fonts available to consoles
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: Vec<Arc<Font>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a font; later registrations do not replace earlier ones with the same name
    pub fn register(&mut self, font: Font) -> Arc<Font> {
        let font = Arc::new(font);
        self.fonts.push(Arc::clone(&font));
        font
    }

    /// Look a font up by exact name
    pub fn find(&self, name: &str) -> Option<Arc<Font>> {
        self.fonts.iter().find(|f| f.name() == name).cloned()
    }

    /// Pick the preferred font for a surface resolution.
    ///
    /// Fonts larger than the surface are skipped. Short surfaces (under 400
    /// lines) favour fonts at most 8 pixels tall, taller surfaces favour the
    /// rest.
    pub fn default_for(&self, xres: u32, yres: u32) -> Option<Arc<Font>> {
        let mut best: Option<(i32, &Arc<Font>)> = None;
        for font in &self.fonts {
            if font.width() > xres || font.height() > yres {
                continue;
            }
            let mut score = font.pref();
            if (yres < 400) == (font.height() <= 8) {
                score += 1000;
            }
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, font));
            }
        }
        best.map(|(_, font)| Arc::clone(font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Font whose glyph `n` has every byte set to `n & 0xff`
    fn patterned_font(name: &str, width: u32, height: u32, count: usize) -> Font {
        let size = height as usize * width.div_ceil(8) as usize;
        let data: Vec<u8> = (0..count)
            .flat_map(|code| std::iter::repeat(code as u8).take(size))
            .collect();
        Font::new(name, width, height, count, data).unwrap()
    }

    #[test]
    fn test_font_validation() {
        assert_eq!(
            Font::new("bad", 0, 16, 256, vec![0; 4096]),
            Err(FontError::InvalidSize { width: 0, height: 16 })
        );
        assert_eq!(
            Font::new("bad", 8, 16, 300, vec![0; 8192]),
            Err(FontError::GlyphCount(300))
        );
        assert_eq!(
            Font::new("bad", 8, 16, 256, vec![0; 100]),
            Err(FontError::ShortData {
                expected: 4096,
                actual: 100
            })
        );
        assert!(Font::new("ok", 8, 16, 256, vec![0; 4096]).is_ok());
    }

    #[test]
    fn test_glyph_offset() {
        let font = patterned_font("t", 8, 16, 256);
        let glyph = font.glyph(b'A' as u16);
        assert_eq!(glyph.len(), 16);
        assert!(glyph.iter().all(|&b| b == b'A'));
    }

    #[test]
    fn test_wide_glyph_pitch() {
        let font = patterned_font("t", 12, 22, 256);
        assert_eq!(font.pitch(), 2);
        assert_eq!(font.glyph(7).len(), 44);
    }

    #[test]
    fn test_glyph_masking() {
        let font = patterned_font("t", 8, 8, 256);
        assert_eq!(font.char_mask(), 0xff);
        assert_eq!(font.glyph(300), font.glyph(300 & 0xff));

        let font = patterned_font("t", 8, 8, 512);
        assert_eq!(font.char_mask(), 0x1ff);
        assert!(font.has_high_glyphs());
        // 300 is within range, so it resolves to its own slot
        assert_eq!(font.glyph(300)[0], (300 & 0xff) as u8);
        assert_eq!(font.glyph(0x3ff), font.glyph(0x1ff));
    }

    #[test]
    fn test_registry_find() {
        let mut fonts = FontRegistry::new();
        fonts.register(patterned_font("VGA8x8", 8, 8, 256));
        fonts.register(patterned_font("VGA8x16", 8, 16, 256));

        assert_eq!(fonts.find("VGA8x16").unwrap().height(), 16);
        assert!(fonts.find("SUN12x22").is_none());
    }

    #[test]
    fn test_registry_default_by_resolution() {
        let mut fonts = FontRegistry::new();
        fonts.register(patterned_font("VGA8x8", 8, 8, 256));
        fonts.register(patterned_font("VGA8x16", 8, 16, 256).with_pref(5));

        assert_eq!(fonts.default_for(640, 200).unwrap().name(), "VGA8x8");
        assert_eq!(fonts.default_for(640, 480).unwrap().name(), "VGA8x16");
    }

    #[test]
    fn test_registry_skips_oversized_fonts() {
        let mut fonts = FontRegistry::new();
        fonts.register(patterned_font("SUN12x22", 12, 22, 256));

        assert!(fonts.default_for(10, 10).is_none());
        assert!(fonts.default_for(640, 480).is_some());
        assert!(FontRegistry::new().default_for(640, 480).is_none());
    }
}
