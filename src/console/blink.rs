//! Cursor blink ticker

use std::sync::{Arc, Mutex};

use crate::display::{lock, DisplayBackend, SharedDisplay};

use super::cursor::CursorState;
use super::CursorSlot;

/// Handle that drives cursor blinking from a periodic source.
///
/// Clones share the console's cursor state, so a timer thread can tick
/// while the owner keeps writing to the console. Both sides take the
/// cursor lock before the display lock.
pub struct CursorBlinker<B> {
    display: SharedDisplay<B>,
    cursor: Arc<Mutex<CursorSlot>>,
}

impl<B> Clone for CursorBlinker<B> {
    fn clone(&self) -> Self {
        Self {
            display: Arc::clone(&self.display),
            cursor: Arc::clone(&self.cursor),
        }
    }
}

impl<B: DisplayBackend> CursorBlinker<B> {
    pub(crate) fn new(display: SharedDisplay<B>, cursor: Arc<Mutex<CursorSlot>>) -> Self {
        Self { display, cursor }
    }

    /// Advance the blink clock; returns true when the device was updated
    pub fn tick(&self) -> bool {
        let mut slot = lock(&self.cursor);
        let effect = slot.controller.tick();
        let mut display = lock(&self.display);
        slot.painter.paint(&mut *display, effect)
    }

    pub fn state(&self) -> CursorState {
        lock(&self.cursor).controller.state()
    }
}
