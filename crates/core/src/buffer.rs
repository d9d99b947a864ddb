//! RGBA8 pixel buffer shared by every stage of the editor.
//!
//! An [`ImageBuffer`] stores `width * height` pixels as four bytes each
//! (R, G, B, A) in row-major order. Colors are straight (not premultiplied)
//! alpha. Stages hand buffers to each other by value; only the stroke
//! rasterizer writes into an existing one.

use crate::error::EditorError;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// A row-major RGBA8 image with straight alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Validates dimensions and returns the byte length of the pixel data.
fn byte_len(width: u32, height: u32) -> Result<usize, EditorError> {
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions);
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(EditorError::InvalidDimensions)
}

impl ImageBuffer {
    /// Creates a fully transparent buffer.
    ///
    /// Returns `EditorError::InvalidDimensions` if either dimension is zero
    /// or the byte length overflows `usize`.
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Creates a buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, EditorError> {
        let len = byte_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wraps existing RGBA8 bytes.
    ///
    /// Returns `EditorError::BufferLength` unless `data.len() == width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EditorError> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(EditorError::BufferLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read-only access to the row-major RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the row-major RGBA bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let idx = self.offset(x, y)?;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[idx..idx + CHANNELS]);
        Some(px)
    }

    /// Overwrites the pixel at `(x, y)`. Writes outside the buffer are dropped.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(idx) = self.offset(x, y) {
            self.data[idx..idx + CHANNELS].copy_from_slice(&rgba);
        }
    }

    /// Resets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// True if every pixel has zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.data.chunks_exact(CHANNELS).all(|px| px[3] == 0)
    }

    /// Returns `EditorError::DimensionMismatch` unless both buffers are the same size.
    pub fn ensure_same_size(&self, other: &ImageBuffer) -> Result<(), EditorError> {
        if self.dimensions() != other.dimensions() {
            return Err(EditorError::DimensionMismatch {
                lhs_w: self.width,
                lhs_h: self.height,
                rhs_w: other.width,
                rhs_h: other.height,
            });
        }
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }
}
