//! Animated GIF playback through a caller-supplied render callback.
//!
//! [`media`] turns a decoded GIF's partial frames into opaque full-canvas
//! frames; [`Player`] runs them on a background timing loop with play, pause
//! and rewind controls.

pub mod error;
pub mod media;
pub mod player;
pub mod settings;

pub use error::{PlayerError, PlayerResult};
pub use media::{CompositedFrame, FrameSequence};
pub use player::{PlayDirection, Player};
pub use settings::PlayerConfig;
