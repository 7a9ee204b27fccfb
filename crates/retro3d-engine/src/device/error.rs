use std::fmt;

use retro3d_tex::TexError;
use thiserror::Error;

use crate::driver::Status;

/// Which format family an adapter failed to provide.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FormatKind {
    /// 16-bit pure RGB texture format.
    Texture,
    /// 16-bit depth-only format.
    Depth,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Texture => f.write_str("16-bit RGB texture"),
            FormatKind::Depth => f.write_str("16-bit depth"),
        }
    }
}

/// Caller-side mistakes, detected before any driver call is issued.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum InputError {
    #[error("pixel buffer is empty")]
    EmptyPixels,
    #[error("pixel buffer of {len} bytes exceeds the {capacity}-byte destination")]
    PixelOverflow { len: usize, capacity: usize },
    #[error("no mip level of {width}x{height} in the texture chain")]
    LevelNotFound { width: u32, height: u32 },
    #[error("transform needs 16 floats, got {0}")]
    TransformLength(usize),
    #[error("no viewport is attached to the device")]
    NoViewport,
    #[error("bitmap has no pixels")]
    EmptyBitmap,
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("mip count must be at least 1")]
    InvalidMipCount,
    #[error("texture size {width}x{height} is outside the supported 8..=1024 range")]
    TextureSize { width: u32, height: u32 },
}

/// Engine error.
///
/// `Subsystem` is produced only by the guard wrapping driver calls; `Input` is
/// raised before the driver is touched. Neither is retried inside the engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("call to {call} failed with status {status}")]
    Subsystem { call: &'static str, status: Status },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("adapter offers no {0} format")]
    FormatUnavailable(FormatKind),

    #[error("texture container: {0}")]
    Container(#[from] TexError),
}

impl Error {
    /// Driver status carried by a subsystem failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Subsystem { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
