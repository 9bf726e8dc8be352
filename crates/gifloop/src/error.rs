use std::path::PathBuf;

pub type PlayerResult<T> = Result<T, PlayerError>;

/// Everything that can go wrong while constructing a player.
///
/// Once a [`crate::Player`] exists there is no runtime error channel; these are
/// all surfaced synchronously from construction.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("failed to open animation {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode GIF: {0}")]
    Decode(#[from] gif::DecodingError),

    #[error("malformed GIF frame {index}: pixel buffer does not match its rectangle")]
    MalformedFrame { index: usize },

    #[error("animation contains no frames")]
    EmptyAnimation,

    #[error("failed to spawn playback thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl PlayerError {
    pub fn load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }
}
