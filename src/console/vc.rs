//! Virtual console view
//!
//! The slice of text-model state the frame buffer console reads and the
//! derived fields it writes back when attaching.

use crate::core::{default_console_palette, CellAttr, ScreenWord, Style, CONSOLE_COLORS};

use super::cursor::CursorShape;

/// Text-model data shared with the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualConsole {
    pub cols: u32,
    pub rows: u32,
    /// Cursor column
    pub x: u32,
    /// Cursor row
    pub y: u32,
    /// Cursor type; the low nibble selects the shape
    pub cursor_type: u32,
    /// Word used to fill cleared cells
    pub erase_char: ScreenWord,
    /// Raw palette, three 8-bit channels per slot
    pub palette: [u8; CONSOLE_COLORS * 3],
    pub can_do_color: bool,
    /// Palette index drawn for underlined text on colour displays
    pub underline_color: u8,
    /// 0x100 when the attached font has 512 glyphs, else 0
    pub hi_font_mask: u16,
    /// Bits flipped to show a selection or pointer over a cell
    pub complement_mask: u16,
}

impl Default for VirtualConsole {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 25,
            x: 0,
            y: 0,
            cursor_type: 0,
            erase_char: ScreenWord::default(),
            palette: default_console_palette(),
            can_do_color: true,
            underline_color: 3,
            hi_font_mask: 0,
            complement_mask: 0x7700,
        }
    }
}

impl VirtualConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether screen words use the 512-glyph layout
    pub fn high_glyphs(&self) -> bool {
        self.hi_font_mask != 0
    }

    pub fn cursor_shape(&self) -> CursorShape {
        CursorShape::from_cursor_type(self.cursor_type)
    }

    /// Attribute of the erase character
    pub fn erase_attr(&self) -> CellAttr {
        self.erase_char.attr(self.high_glyphs())
    }

    /// Build an attribute byte for this console's color capability
    pub fn build_attr(&self, fg: u8, bg: u8, style: Style) -> CellAttr {
        CellAttr::build(fg, bg, style, self.can_do_color, self.underline_color)
    }

    /// Encode a glyph code and attribute as a screen word
    pub fn word(&self, code: u16, attr: CellAttr) -> ScreenWord {
        ScreenWord::new(code, attr, self.high_glyphs())
    }

    /// Raw (red, green, blue) of a palette slot
    pub fn palette_entry(&self, slot: usize) -> Option<(u8, u8, u8)> {
        let base = slot.checked_mul(3)?;
        let rgb = self.palette.get(base..base + 3)?;
        Some((rgb[0], rgb[1], rgb[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let vc = VirtualConsole::new();
        assert_eq!((vc.cols, vc.rows), (80, 25));
        assert_eq!(vc.erase_attr(), CellAttr::default());
        assert_eq!(vc.cursor_shape(), CursorShape::Default);
        assert_eq!(vc.palette_entry(1), Some((0xaa, 0x00, 0x00)));
        assert_eq!(vc.palette_entry(16), None);
    }

    #[test]
    fn test_word_layout_follows_hi_font_mask() {
        let mut vc = VirtualConsole::new();
        let attr = CellAttr::new(0x0e, 0x01);
        assert_eq!(vc.word(b'A' as u16, attr).0, 0x1e41);

        vc.hi_font_mask = 0x100;
        let word = vc.word(0x141, attr);
        assert_eq!(word.0, (0x1e << 9) | 0x141);
        assert_eq!(word.attr(vc.high_glyphs()), attr);
    }

    #[test]
    fn test_build_attr_mono_underline() {
        let mut vc = VirtualConsole::new();
        vc.can_do_color = false;
        let style = Style {
            underline: true,
            ..Style::default()
        };
        assert_eq!(vc.build_attr(7, 0, style).fg(), CellAttr::MONO_UNDERLINE);
    }

    #[test]
    fn test_build_attr_colour_underline() {
        let mut vc = VirtualConsole::new();
        let style = Style {
            underline: true,
            ..Style::default()
        };
        assert_eq!(vc.build_attr(7, 0, style).fg(), 3);
        vc.underline_color = 6;
        assert_eq!(vc.build_attr(7, 0, style), CellAttr::new(6, 0));
        assert_eq!(vc.build_attr(7, 1, Style::default()), CellAttr::new(7, 1));
    }
}
