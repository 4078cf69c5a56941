//! Screen words and cell attributes
//!
//! The text model stores each cell as a 16-bit screen word: the glyph code
//! in the low byte and the attribute byte above it. With a 512-glyph font
//! the glyph code takes nine bits and the attribute moves up by one.
//!
//! The attribute byte holds the foreground index in the low nibble and the
//! background index in the high nibble. Bit 3 of the foreground is the
//! intensity (bold) bit, bit 3 of the background is the blink bit.

use serde::{Deserialize, Serialize};

/// Text style requested for a cell, before it is folded into an attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub bold: bool,
    pub underline: bool,
    pub blink: bool,
    pub reverse: bool,
}

/// An attribute byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAttr(pub u8);

impl Default for CellAttr {
    /// Light grey on black
    fn default() -> Self {
        CellAttr(0x07)
    }
}

impl CellAttr {
    const INTENSITY: u8 = 0x08;
    const BLINK: u8 = 0x80;

    /// Attribute index used for underlined text on monochrome displays
    pub const MONO_UNDERLINE: u8 = 0x01;

    pub const fn new(fg: u8, bg: u8) -> Self {
        CellAttr((fg & 0x0f) | ((bg & 0x0f) << 4))
    }

    /// Fold colors and a style into an attribute byte.
    ///
    /// Underline has no bit of its own: colour displays draw underlined
    /// text in `underline_color`, monochrome displays use the underline
    /// attribute index.
    pub fn build(fg: u8, bg: u8, style: Style, can_do_color: bool, underline_color: u8) -> Self {
        let mut fg = fg & 0x0f;
        let mut bg = bg & 0x0f;

        if style.underline {
            fg = if can_do_color {
                underline_color & 0x0f
            } else {
                Self::MONO_UNDERLINE
            };
        }
        if style.reverse {
            std::mem::swap(&mut fg, &mut bg);
        }

        let mut attr = CellAttr::new(fg, bg);
        if style.bold {
            attr.0 |= Self::INTENSITY;
        }
        if style.blink {
            attr.0 |= Self::BLINK;
        }
        attr
    }

    /// Foreground palette index (0-15)
    pub fn fg(self) -> u8 {
        self.0 & 0x0f
    }

    /// Background palette index (0-15)
    pub fn bg(self) -> u8 {
        (self.0 >> 4) & 0x0f
    }

    pub fn is_bold(self) -> bool {
        self.0 & Self::INTENSITY != 0
    }

    pub fn is_blink(self) -> bool {
        self.0 & Self::BLINK != 0
    }
}

/// A glyph code and attribute packed into one 16-bit word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenWord(pub u16);

impl Default for ScreenWord {
    /// Blank cell with the default attribute
    fn default() -> Self {
        ScreenWord::new(b' ' as u16, CellAttr::default(), false)
    }
}

impl ScreenWord {
    /// Pack a glyph code and attribute.
    ///
    /// `high_glyphs` selects the 512-glyph layout, where the attribute sits
    /// one bit higher; the top attribute bit is lost in that layout.
    pub fn new(code: u16, attr: CellAttr, high_glyphs: bool) -> Self {
        if high_glyphs {
            ScreenWord((code & 0x1ff) | ((attr.0 as u16) << 9))
        } else {
            ScreenWord((code & 0xff) | ((attr.0 as u16) << 8))
        }
    }

    /// Glyph code after masking with the font's character mask
    pub fn code(self, char_mask: u16) -> u16 {
        self.0 & char_mask
    }

    /// Attribute byte for the given layout
    pub fn attr(self, high_glyphs: bool) -> CellAttr {
        let shift = if high_glyphs { 9 } else { 8 };
        CellAttr((self.0 >> shift) as u8)
    }

    /// Foreground index for the given layout
    pub fn fg(self, high_glyphs: bool) -> u8 {
        self.attr(high_glyphs).fg()
    }

    /// Background index for the given layout
    pub fn bg(self, high_glyphs: bool) -> u8 {
        self.attr(high_glyphs).bg()
    }
}

/// Encode a string as screen words sharing one attribute
pub fn encode_str(text: &str, attr: CellAttr, high_glyphs: bool) -> Vec<ScreenWord> {
    text.chars()
        .map(|c| {
            let code = if (c as u32) < 0x100 { c as u16 } else { b'?' as u16 };
            ScreenWord::new(code, attr, high_glyphs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_nibbles() {
        let attr = CellAttr::new(0x0e, 0x01);
        assert_eq!(attr.0, 0x1e);
        assert_eq!(attr.fg(), 0x0e);
        assert_eq!(attr.bg(), 0x01);
        assert!(attr.is_bold());
        assert!(!attr.is_blink());
    }

    #[test]
    fn test_build_style_flags() {
        let style = Style {
            bold: true,
            blink: true,
            ..Default::default()
        };
        let attr = CellAttr::build(2, 4, style, true, 3);
        assert_eq!(attr.fg(), 0x0a);
        assert_eq!(attr.bg(), 0x0c);
        assert!(attr.is_bold());
        assert!(attr.is_blink());
    }

    #[test]
    fn test_build_reverse_swaps() {
        let style = Style {
            reverse: true,
            ..Default::default()
        };
        let attr = CellAttr::build(7, 1, style, true, 3);
        assert_eq!(attr.fg(), 1);
        assert_eq!(attr.bg(), 7);
    }

    #[test]
    fn test_build_underline() {
        let style = Style {
            underline: true,
            ..Default::default()
        };
        assert_eq!(CellAttr::build(7, 0, style, true, 3).fg(), 3);
        assert_eq!(
            CellAttr::build(7, 0, style, false, 3).fg(),
            CellAttr::MONO_UNDERLINE
        );
    }

    #[test]
    fn test_screen_word_layouts() {
        let attr = CellAttr::new(0x0f, 0x04);

        let word = ScreenWord::new(b'A' as u16, attr, false);
        assert_eq!(word.0, 0x4f41);
        assert_eq!(word.code(0xff), b'A' as u16);
        assert_eq!(word.fg(false), 0x0f);
        assert_eq!(word.bg(false), 0x04);

        let word = ScreenWord::new(0x141, attr, true);
        assert_eq!(word.code(0x1ff), 0x141);
        assert_eq!(word.fg(true), 0x0f);
        assert_eq!(word.bg(true), 0x04);
    }

    #[test]
    fn test_default_word_is_blank() {
        let word = ScreenWord::default();
        assert_eq!(word.0, 0x0720);
    }

    #[test]
    fn test_encode_str() {
        let words = encode_str("hi\u{263a}", CellAttr::default(), false);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].code(0xff), b'h' as u16);
        assert_eq!(words[2].code(0xff), b'?' as u16);
    }
}
