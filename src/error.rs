//! Error types for the compositor and its configuration

use crate::surface::{Rect, SurfaceId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not allocate a surface at the requested bounds
    #[error("cannot place surface {rect:?} on a {width}x{height} screen")]
    SurfaceOutOfBounds { rect: Rect, width: u16, height: u16 },

    #[error("surface {0:?} does not exist")]
    UnknownSurface(SurfaceId),

    #[error("failed to read config {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
