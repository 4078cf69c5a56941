//! Draw-call recording
//!
//! [`Recorder`] wraps another backend and logs every device call it
//! forwards. The log is serializable, which makes it usable both for
//! assertions in tests and as machine-readable output of the headless
//! runner.

use serde::{Deserialize, Serialize};

use crate::core::{ColorMap, Point, Rect};

use super::{
    BackendError, BlankMode, Capabilities, DisplayBackend, HwCursor, Image, PseudoPalette,
    RasterOp, SurfaceInfo,
};

/// One device call as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCall {
    Open,
    SetPar,
    FillRect {
        rect: Rect,
        color: u32,
        rop: RasterOp,
    },
    CopyArea {
        src: Rect,
        dst: Point,
    },
    ImageBlit {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        depth: u8,
        fg_color: u32,
        bg_color: u32,
        data: Vec<u8>,
    },
    SetCursor {
        cursor: HwCursor,
    },
    SetColorMap {
        cmap: ColorMap,
    },
    Blank {
        mode: BlankMode,
    },
}

/// Backend decorator that records every call before forwarding it
#[derive(Debug, Clone)]
pub struct Recorder<B> {
    inner: B,
    calls: Vec<DrawCall>,
}

impl<B: DisplayBackend> Recorder<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    /// Calls recorded so far, oldest first
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the log
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching a predicate
    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: DisplayBackend> DisplayBackend for Recorder<B> {
    fn info(&self) -> SurfaceInfo {
        self.inner.info()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn pseudo_palette(&self) -> PseudoPalette<'_> {
        self.inner.pseudo_palette()
    }

    fn open(&mut self) -> Result<(), BackendError> {
        self.calls.push(DrawCall::Open);
        self.inner.open()
    }

    fn set_par(&mut self) {
        self.calls.push(DrawCall::SetPar);
        self.inner.set_par();
    }

    fn fill_rect(&mut self, rect: Rect, color: u32, rop: RasterOp) {
        self.calls.push(DrawCall::FillRect { rect, color, rop });
        self.inner.fill_rect(rect, color, rop);
    }

    fn copy_area(&mut self, src: Rect, dst: Point) {
        self.calls.push(DrawCall::CopyArea { src, dst });
        self.inner.copy_area(src, dst);
    }

    fn image_blit(&mut self, image: &Image<'_>) {
        self.calls.push(DrawCall::ImageBlit {
            x: image.x,
            y: image.y,
            width: image.width,
            height: image.height,
            depth: image.depth,
            fg_color: image.fg_color,
            bg_color: image.bg_color,
            data: image.data.to_vec(),
        });
        self.inner.image_blit(image);
    }

    fn set_cursor(&mut self, cursor: &HwCursor) {
        self.calls.push(DrawCall::SetCursor { cursor: *cursor });
        self.inner.set_cursor(cursor);
    }

    fn set_color_map(&mut self, cmap: &ColorMap) -> Result<(), BackendError> {
        self.calls.push(DrawCall::SetColorMap { cmap: cmap.clone() });
        self.inner.set_color_map(cmap)
    }

    fn blank(&mut self, mode: BlankMode) {
        self.calls.push(DrawCall::Blank { mode });
        self.inner.blank(mode);
    }
}
