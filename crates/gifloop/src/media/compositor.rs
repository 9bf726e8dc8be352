use image::{Rgba, RgbaImage};

use super::types::{CompositedFrame, FrameSequence, RawFrame, RawFrameStack};
use crate::error::{PlayerError, PlayerResult};

/// Canvas color under frame 0 wherever it leaves pixels unspecified.
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Resolve the stack's leave-in-place disposal into opaque full-canvas frames.
///
/// Each output frame is the previous one with the raw frame's non-transparent
/// pixels drawn over it. Only the raw rectangle (clipped to the canvas) is
/// visited; everywhere else the copied canvas is already the right answer.
pub fn composite(stack: &RawFrameStack) -> PlayerResult<FrameSequence> {
    if stack.is_empty() {
        return Err(PlayerError::EmptyAnimation);
    }

    let mut canvas = RgbaImage::from_pixel(stack.width, stack.height, BACKGROUND);
    let mut frames = Vec::with_capacity(stack.len());

    for (index, raw) in stack.frames.iter().enumerate() {
        draw_over(&mut canvas, raw);
        frames.push(CompositedFrame {
            index,
            image: canvas.clone(),
            delay_cs: raw.delay_cs,
        });
    }

    log::debug!(
        "Composited {} frame{} at {}x{}",
        frames.len(),
        if frames.len() == 1 { "" } else { "s" },
        stack.width,
        stack.height
    );

    Ok(FrameSequence::new(frames))
}

/// Overwrite `canvas` with every non-transparent pixel of `raw` inside its rectangle.
fn draw_over(canvas: &mut RgbaImage, raw: &RawFrame) {
    let (x0, y0, x1, y1) = raw.rect();
    let x1 = x1.min(canvas.width());
    let y1 = y1.min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let px = raw.pixels.get_pixel(x - raw.left, y - raw.top);
            if px[3] != 0 {
                canvas.put_pixel(x, y, *px);
            }
        }
    }
}
