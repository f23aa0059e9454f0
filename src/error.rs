//! Error type shared by every stage of the profile pipeline.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors that can occur while loading, deriving, rendering, or writing a profile.
///
/// Configuration problems are always reported before anything is written, so a
/// `Config` error never leaves partial artifacts behind.
#[derive(Error, Debug)]
pub enum GaultError {
    /// Invalid input: mismatched series lengths, unknown compass direction,
    /// out-of-range index, malformed TOML or non-numeric readings
    #[error("configuration error: {0}")]
    Config(String),

    /// Creating the output directory or writing an artifact failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The drawing backend rejected a primitive or failed to flush
    #[error("render failed: {0}")]
    Render(String),

    /// Dataset snapshot could not be encoded or decoded
    #[error("dataset serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GaultError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GaultError::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GaultError::Io {
            path: path.into(),
            source,
        }
    }
}
