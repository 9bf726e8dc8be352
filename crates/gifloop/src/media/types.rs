use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

/// One decoded GIF frame: only the sub-rectangle it overwrites.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub left: u32,
    pub top: u32,
    /// Pixels of the sub-rectangle, `pixels.dimensions()` is its width and height.
    pub pixels: RgbaImage,
    /// Display delay hint in hundredths of a second.
    pub delay_cs: u16,
}

impl RawFrame {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Bounding rectangle on the canvas as `(x0, y0, x1, y1)`, max exclusive.
    pub fn rect(&self) -> (u32, u32, u32, u32) {
        (
            self.left,
            self.top,
            self.left + self.width(),
            self.top + self.height(),
        )
    }

    /// Whether canvas coordinate (x, y) lies inside this frame's rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x0, y0, x1, y1) = self.rect();
        x0 <= x && x < x1 && y0 <= y && y < y1
    }
}

/// Decoded frame stack plus the logical screen size it is drawn onto.
#[derive(Debug, Clone)]
pub struct RawFrameStack {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<RawFrame>,
}

impl RawFrameStack {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// A self-contained, fully opaque full-canvas frame.
#[derive(Debug, Clone)]
pub struct CompositedFrame {
    /// Position in the sequence.
    pub index: usize,
    pub image: RgbaImage,
    /// Delay hint carried over from the raw frame.
    pub delay_cs: u16,
}

impl CompositedFrame {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Fixed-length, immutable list of composited frames.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Arc<CompositedFrame>>,
}

impl FrameSequence {
    pub(crate) fn new(frames: Vec<CompositedFrame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<CompositedFrame>> {
        self.frames.get(index)
    }

    pub fn first(&self) -> Option<&Arc<CompositedFrame>> {
        self.frames.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompositedFrame>> {
        self.frames.iter()
    }

    /// Canvas dimensions, (0, 0) for an empty sequence.
    pub fn dimensions(&self) -> (u32, u32) {
        self.first().map_or((0, 0), |f| f.dimensions())
    }
}

/// Convert a GIF delay hint (centiseconds) to a duration, using `fallback`
/// when the hint is zero.
pub fn delay_from_hint(delay_cs: u16, fallback: Duration) -> Duration {
    if delay_cs == 0 {
        fallback
    } else {
        Duration::from_millis(u64::from(delay_cs) * 10)
    }
}
