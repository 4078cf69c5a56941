//! Color maps
//!
//! A color map is the device-level table mapping palette slots to 16-bit
//! per channel RGB values. Consoles keep their palette as 8-bit channel
//! values (three bytes per slot); pushing it to the device widens each
//! channel by replicating the byte, `(v << 8) | v`.

use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};

/// Number of palette slots a console carries
pub const CONSOLE_COLORS: usize = 16;

/// Standard VGA text palette (red, green, blue per slot)
pub const DEFAULT_PALETTE: [(u8, u8, u8); CONSOLE_COLORS] = [
    (0x00, 0x00, 0x00), // 0: Black
    (0xaa, 0x00, 0x00), // 1: Red
    (0x00, 0xaa, 0x00), // 2: Green
    (0xaa, 0x55, 0x00), // 3: Brown
    (0x00, 0x00, 0xaa), // 4: Blue
    (0xaa, 0x00, 0xaa), // 5: Magenta
    (0x00, 0xaa, 0xaa), // 6: Cyan
    (0xaa, 0xaa, 0xaa), // 7: Light Grey
    (0x55, 0x55, 0x55), // 8: Dark Grey
    (0xff, 0x55, 0x55), // 9: Bright Red
    (0x55, 0xff, 0x55), // 10: Bright Green
    (0xff, 0xff, 0x55), // 11: Yellow
    (0x55, 0x55, 0xff), // 12: Bright Blue
    (0xff, 0x55, 0xff), // 13: Bright Magenta
    (0x55, 0xff, 0xff), // 14: Bright Cyan
    (0xff, 0xff, 0xff), // 15: White
];

/// Console palette in the raw byte layout (r, g, b, r, g, b, ...)
pub fn default_console_palette() -> [u8; CONSOLE_COLORS * 3] {
    let mut raw = [0u8; CONSOLE_COLORS * 3];
    for (slot, &(r, g, b)) in DEFAULT_PALETTE.iter().enumerate() {
        raw[slot * 3] = r;
        raw[slot * 3 + 1] = g;
        raw[slot * 3 + 2] = b;
    }
    raw
}

/// Widen an 8-bit channel value to 16 bits
pub fn widen_channel(value: u8) -> u16 {
    ((value as u16) << 8) | value as u16
}

/// Device color map: parallel channel tables starting at slot `start`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    pub start: u32,
    pub red: Vec<u16>,
    pub green: Vec<u16>,
    pub blue: Vec<u16>,
}

impl ColorMap {
    /// Allocate a zeroed (all black) map with `len` slots
    pub fn try_with_len(len: usize) -> Result<Self, TryReserveError> {
        let mut map = ColorMap::default();
        for channel in [&mut map.red, &mut map.green, &mut map.blue] {
            channel.try_reserve_exact(len)?;
            channel.resize(len, 0);
        }
        Ok(map)
    }

    /// A map of `len` slots filled from the standard VGA palette
    pub fn try_default(len: usize) -> Result<Self, TryReserveError> {
        let mut map = Self::try_with_len(len)?;
        for (slot, &(r, g, b)) in DEFAULT_PALETTE.iter().take(len).enumerate() {
            map.set(slot, widen_channel(r), widen_channel(g), widen_channel(b));
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Store a slot; returns false when the slot is outside the map
    pub fn set(&mut self, slot: usize, red: u16, green: u16, blue: u16) -> bool {
        if slot >= self.len() {
            return false;
        }
        self.red[slot] = red;
        self.green[slot] = green;
        self.blue[slot] = blue;
        true
    }

    /// The (red, green, blue) triple of a slot
    pub fn get(&self, slot: usize) -> Option<(u16, u16, u16)> {
        Some((
            *self.red.get(slot)?,
            *self.green.get(slot)?,
            *self.blue.get(slot)?,
        ))
    }

    /// Iterate over (red, green, blue) triples
    pub fn entries(&self) -> impl Iterator<Item = (u16, u16, u16)> + '_ {
        self.red
            .iter()
            .zip(&self.green)
            .zip(&self.blue)
            .map(|((&r, &g), &b)| (r, g, b))
    }
}
