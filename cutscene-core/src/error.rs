use thiserror::Error;

/// Errors raised while opening or decoding a cutscene.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The resource manager has no stream for this hash.
    #[error("resource {hash:08X} not found")]
    ResourceNotFound { hash: u32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cutscene container: {0}")]
    InvalidContainer(String),

    #[error("lz4 decompress failed: {0}")]
    Decompress(String),

    /// A frame was requested after the last one had been decoded.
    #[error("no frames left in stream")]
    EndOfStream,
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
