//! Glyph rendering
//!
//! Draws runs of screen words as 1-bit bitmap blits, one blit per cell,
//! left to right. Colors are resolved per cell from the word's attribute.

use crate::core::{ConsoleGeometry, Font, ScreenWord};
use crate::display::{DisplayBackend, Image};

use super::ColorResolver;

/// Draws glyphs of one font onto one surface
#[derive(Debug, Clone, Copy)]
pub struct GlyphRenderer<'a> {
    font: &'a Font,
    geometry: &'a ConsoleGeometry,
    resolver: ColorResolver,
}

impl<'a> GlyphRenderer<'a> {
    pub fn new(font: &'a Font, geometry: &'a ConsoleGeometry, resolver: ColorResolver) -> Self {
        Self {
            font,
            geometry,
            resolver,
        }
    }

    /// Draw one cell
    pub fn draw_glyph<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        word: ScreenWord,
        row: u32,
        col: u32,
    ) {
        self.draw_glyphs(backend, std::slice::from_ref(&word), row, col);
    }

    /// Draw consecutive cells starting at (`row`, `col`).
    ///
    /// Cells past the right edge of the grid are dropped.
    pub fn draw_glyphs<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        words: &[ScreenWord],
        row: u32,
        col: u32,
    ) {
        if row >= self.geometry.rows {
            tracing::debug!("glyph row {} outside {} rows", row, self.geometry.rows);
            return;
        }

        let high_glyphs = self.font.has_high_glyphs();
        let char_mask = self.font.char_mask();
        let available = self.geometry.cols.saturating_sub(col) as usize;
        if words.len() > available {
            tracing::debug!(
                "dropping {} glyphs past column {}",
                words.len() - available,
                self.geometry.cols
            );
        }

        let origin = self.geometry.cell_to_pixel(row, col);
        let mut x = origin.x;
        for &word in words.iter().take(available) {
            let (fg_color, bg_color) =
                self.resolver
                    .resolve_word(backend.pseudo_palette(), word, high_glyphs);
            let image = Image {
                x,
                y: origin.y,
                width: self.font.width(),
                height: self.font.height(),
                depth: 1,
                fg_color,
                bg_color,
                data: self.font.glyph(word.code(char_mask)),
            };
            backend.image_blit(&image);
            x += self.geometry.cell_width;
        }
    }
}
