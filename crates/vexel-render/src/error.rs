//! Error types shared by all drawing backends.

use vexel_core::PixelFormat;

use crate::readback::ReadbackError;

/// Errors surfaced by [`Drawing`](crate::Drawing) operations.
///
/// Device-level failures (out-of-memory, device loss) are not retried
/// anywhere; they propagate to the caller of the public operation that
/// triggered them.
#[derive(Debug)]
pub enum DrawingError {
    /// A surface created by a different backend was passed in.
    InvalidSurface,
    /// A draw parameter failed validation.
    InvalidParameter(&'static str),
    /// The backend does not implement the requested operation.
    Unsupported(&'static str),
    /// The pixel format has no native equivalent on this backend.
    UnsupportedFormat(PixelFormat),
    /// Image decode/encode failed.
    Image(image::ImageError),
    /// File I/O failed.
    Io(std::io::Error),
    /// GPU-to-CPU readback failed.
    Readback(ReadbackError),
}

impl std::fmt::Display for DrawingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSurface => write!(f, "surface does not belong to this backend"),
            Self::InvalidParameter(what) => write!(f, "invalid parameter: {}", what),
            Self::Unsupported(what) => write!(f, "operation not implemented: {}", what),
            Self::UnsupportedFormat(format) => {
                write!(f, "pixel format {:?} is not supported by this backend", format)
            }
            Self::Image(err) => write!(f, "image codec error: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Readback(err) => write!(f, "readback error: {}", err),
        }
    }
}

impl std::error::Error for DrawingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Readback(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image::ImageError> for DrawingError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<std::io::Error> for DrawingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ReadbackError> for DrawingError {
    fn from(err: ReadbackError) -> Self {
        Self::Readback(err)
    }
}
