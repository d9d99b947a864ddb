//! Error types for the retouch editor.

use thiserror::Error;

/// Errors produced by editor operations.
///
/// Out-of-range filter or brush values are never reported here: setters clamp
/// them. Strokes that leave the buffer are clipped, not rejected.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Width or height was zero, or `width * height * 4` overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// Two buffers had different dimensions for a per-pixel operation.
    #[error("dimension mismatch: ({lhs_w}, {lhs_h}) vs ({rhs_w}, {rhs_h})")]
    DimensionMismatch {
        lhs_w: u32,
        lhs_h: u32,
        rhs_w: u32,
        rhs_h: u32,
    },

    /// Raw pixel bytes did not match `width * height * 4`.
    #[error("buffer length mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The bytes are not a valid raster image.
    #[error("could not load image: {0}")]
    Decode(String),

    /// The bytes are a recognised image format that the editor does not read.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The composite could not be encoded.
    #[error("could not encode image: {0}")]
    Encode(String),

    /// A filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The operation needs a loaded image but the session is empty.
    #[error("no image loaded")]
    NotLoaded,

    /// A display rectangle had a zero or negative extent.
    #[error("invalid display rect: width and height must be positive")]
    InvalidDisplayRect,
}
