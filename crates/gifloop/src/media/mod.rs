pub mod compositor;
pub mod decoder;
pub mod types;

use std::path::Path;

pub use compositor::composite;
pub use decoder::{decode_gif, load_gif};
pub use types::{CompositedFrame, FrameSequence, RawFrame, RawFrameStack, delay_from_hint};

use crate::error::PlayerResult;

/// Load a GIF from disk and composite it into renderable frames.
pub fn load_animation(path: &Path) -> PlayerResult<FrameSequence> {
    let stack = load_gif(path)?;
    composite(&stack)
}
