//! Mapping between display space (where pointer events happen) and buffer
//! space (pixel coordinates of the working image).
//!
//! The image may be shown at any on-screen size; the mapping is a plain
//! per-axis scale and offset, so a point lands on the same buffer pixel
//! whatever the display zoom or device pixel ratio.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// The on-screen rectangle the working image is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDisplayRect")]
pub struct DisplayRect {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

#[derive(Deserialize)]
struct RawDisplayRect {
    #[serde(default)]
    left: f32,
    #[serde(default)]
    top: f32,
    width: f32,
    height: f32,
}

impl TryFrom<RawDisplayRect> for DisplayRect {
    type Error = EditorError;

    fn try_from(raw: RawDisplayRect) -> Result<Self, Self::Error> {
        DisplayRect::new(raw.left, raw.top, raw.width, raw.height)
    }
}

impl DisplayRect {
    /// Creates a display rect.
    ///
    /// Returns `EditorError::InvalidDisplayRect` unless width and height are
    /// finite and positive; a degenerate rect has no inverse mapping.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Result<Self, EditorError> {
        let valid = [left, top, width, height].iter().all(|v| v.is_finite())
            && width > 0.0
            && height > 0.0;
        if !valid {
            return Err(EditorError::InvalidDisplayRect);
        }
        Ok(Self {
            left,
            top,
            width,
            height,
        })
    }

    /// A rect at the origin showing the buffer at 1:1 scale.
    pub fn identity(buffer_size: (u32, u32)) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: buffer_size.0.max(1) as f32,
            height: buffer_size.1.max(1) as f32,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

fn buffer_extent(buffer_size: (u32, u32)) -> Vec2 {
    Vec2::new(buffer_size.0 as f32, buffer_size.1 as f32)
}

/// Maps a device point to buffer space:
/// `b = (d - rect.origin) * buffer_size / rect.size`, per axis.
///
/// No clamping is done; points outside the image map outside the buffer and
/// are clipped later by the rasterizer.
pub fn to_buffer_space(device: Vec2, rect: &DisplayRect, buffer_size: (u32, u32)) -> Vec2 {
    (device - rect.origin()) * buffer_extent(buffer_size) / rect.size()
}

/// Inverse of [`to_buffer_space`], for hosts drawing a brush cursor.
pub fn to_display_space(buffer: Vec2, rect: &DisplayRect, buffer_size: (u32, u32)) -> Vec2 {
    buffer * rect.size() / buffer_extent(buffer_size) + rect.origin()
}
