//! Color resolution
//!
//! Turns the palette indices stored in cell attributes into native pixel
//! values. Indexed surfaces take the index as-is and let the device map it
//! through its color map. Packed-pixel surfaces look the index up in the
//! backend's pseudo-palette, which is 32 bits wide above 16 bits per pixel
//! and 16 bits wide otherwise.
//!
//! The pseudo-palette is passed in on every call so a palette change is
//! visible to the very next draw.

use crate::core::{CellAttr, ScreenWord};
use crate::display::{PseudoPalette, SurfaceInfo};

/// Which half of an attribute to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Foreground,
    Background,
}

/// Attribute-to-native-color mapping for one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorResolver {
    indexed: bool,
    wide: bool,
}

impl ColorResolver {
    pub fn new(info: &SurfaceInfo) -> Self {
        Self {
            indexed: info.visual.is_indexed(),
            wide: info.bits_per_pixel > 16,
        }
    }

    /// Native value of a palette index.
    ///
    /// Indices outside the pseudo-palette are a caller contract violation;
    /// they resolve to 0 rather than reading out of bounds.
    pub fn resolve_index(&self, palette: PseudoPalette<'_>, index: u8) -> u32 {
        if self.indexed {
            return index as u32;
        }

        let slot = index as usize;
        let value = match (self.wide, palette) {
            (true, PseudoPalette::Wide(table)) => table.get(slot).copied(),
            (false, PseudoPalette::Narrow(table)) => table.get(slot).map(|&v| v as u32),
            // A backend reporting the other width still gets a sensible lookup.
            (_, PseudoPalette::Wide(table)) => table.get(slot).copied(),
            (_, PseudoPalette::Narrow(table)) => table.get(slot).map(|&v| v as u32),
            (_, PseudoPalette::None) => None,
        };
        value.unwrap_or_else(|| {
            tracing::debug!("palette index {} has no native color", index);
            0
        })
    }

    /// Native value of one half of an attribute
    pub fn resolve(&self, palette: PseudoPalette<'_>, attr: CellAttr, role: ColorRole) -> u32 {
        let index = match role {
            ColorRole::Foreground => attr.fg(),
            ColorRole::Background => attr.bg(),
        };
        self.resolve_index(palette, index)
    }

    /// Foreground and background of a screen word
    pub fn resolve_word(
        &self,
        palette: PseudoPalette<'_>,
        word: ScreenWord,
        high_glyphs: bool,
    ) -> (u32, u32) {
        let attr = word.attr(high_glyphs);
        (
            self.resolve(palette, attr, ColorRole::Foreground),
            self.resolve(palette, attr, ColorRole::Background),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Visual;

    fn surface(bits_per_pixel: u8, visual: Visual) -> SurfaceInfo {
        SurfaceInfo {
            id: "test".to_string(),
            xres: 640,
            yres: 480,
            bits_per_pixel,
            visual,
            accelerated: false,
        }
    }

    #[test]
    fn test_indexed_returns_index() {
        let resolver = ColorResolver::new(&surface(8, Visual::PseudoColor));
        for index in 0..16u8 {
            let attr = CellAttr::new(index, 15 - index);
            assert_eq!(
                resolver.resolve(PseudoPalette::None, attr, ColorRole::Foreground),
                index as u32
            );
            assert_eq!(
                resolver.resolve(PseudoPalette::None, attr, ColorRole::Background),
                (15 - index) as u32
            );
        }
    }

    #[test]
    fn test_wide_lookup() {
        let resolver = ColorResolver::new(&surface(32, Visual::TrueColor));
        let table: Vec<u32> = (0..16).map(|i| 0x0010_0000 * i).collect();
        let attr = CellAttr::new(3, 9);
        assert_eq!(
            resolver.resolve(PseudoPalette::Wide(&table), attr, ColorRole::Foreground),
            0x0030_0000
        );
        assert_eq!(
            resolver.resolve(PseudoPalette::Wide(&table), attr, ColorRole::Background),
            0x0090_0000
        );
    }

    #[test]
    fn test_narrow_lookup() {
        let resolver = ColorResolver::new(&surface(16, Visual::TrueColor));
        let table: Vec<u16> = (0..16).map(|i| 0x1000 + i).collect();
        assert_eq!(resolver.resolve_index(PseudoPalette::Narrow(&table), 4), 0x1004);
    }

    #[test]
    fn test_lookup_is_not_cached() {
        let resolver = ColorResolver::new(&surface(32, Visual::DirectColor));
        let mut table = vec![0u32; 16];
        assert_eq!(resolver.resolve_index(PseudoPalette::Wide(&table), 2), 0);
        table[2] = 0x00ab_cdef;
        assert_eq!(resolver.resolve_index(PseudoPalette::Wide(&table), 2), 0x00ab_cdef);
    }

    #[test]
    fn test_missing_slot_resolves_to_zero() {
        let resolver = ColorResolver::new(&surface(32, Visual::TrueColor));
        assert_eq!(resolver.resolve_index(PseudoPalette::Wide(&[1, 2]), 9), 0);
        assert_eq!(resolver.resolve_index(PseudoPalette::None, 1), 0);
    }

    #[test]
    fn test_resolve_word() {
        let resolver = ColorResolver::new(&surface(8, Visual::PseudoColor));
        let word = ScreenWord::new(b'x' as u16, CellAttr::new(0x0e, 0x01), false);
        assert_eq!(
            resolver.resolve_word(PseudoPalette::None, word, false),
            (0x0e, 0x01)
        );
    }
}
