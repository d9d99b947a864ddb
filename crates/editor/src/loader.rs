//! Image source loading: decode encoded bytes and fit them to the working size.
//!
//! The host owns network and file I/O and hands over raw bytes. Decoding is
//! limited to PNG and JPEG; a recognised but unsupported format is reported
//! separately from bytes that are not an image at all.

use image::imageops::FilterType;
use image::ImageFormat;
use retouch_core::{EditorError, ImageBuffer};

/// Longest side of the working image unless configured otherwise.
pub const DEFAULT_MAX_SIDE: u32 = 1024;

/// Formats the loader decodes.
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

/// A decoded image fitted to the working size.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Working-resolution pixels.
    pub buffer: ImageBuffer,
    /// Format detected from the bytes.
    pub format: ImageFormat,
    /// Native dimensions before downscaling.
    pub source_dimensions: (u32, u32),
}

impl LoadedImage {
    pub fn was_downscaled(&self) -> bool {
        self.buffer.dimensions() != self.source_dimensions
    }
}

/// Fits `(width, height)` inside `max_side` while keeping the aspect ratio.
///
/// A landscape image wider than `max_side` gets width `max_side` and a
/// rounded proportional height; a portrait or square image taller than
/// `max_side` is treated symmetrically. Images already within bounds are
/// returned unchanged. Both sides are at least 1.
pub fn constrain_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let max = max_side.max(1);
    let (w, h) = (width.max(1), height.max(1));
    let scaled = |num: u32, den: u32| ((max as f64 / den as f64) * num as f64).round() as u32;
    let (w, h) = if w > h && w > max {
        (max, scaled(h, w))
    } else if h >= w && h > max {
        (scaled(w, h), max)
    } else {
        (w, h)
    };
    (w.max(1), h.max(1))
}

/// Detects the format and decodes `bytes` to RGBA8 at native resolution.
pub fn decode(bytes: &[u8]) -> Result<(image::RgbaImage, ImageFormat), EditorError> {
    let format = image::guess_format(bytes).map_err(|e| EditorError::Decode(e.to_string()))?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(EditorError::UnsupportedFormat(format!("{format:?}")));
    }
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| EditorError::Decode(e.to_string()))?;
    Ok((img.to_rgba8(), format))
}

/// Decodes `bytes` and downscales the result so neither side exceeds `max_side`.
pub fn load(bytes: &[u8], max_side: u32) -> Result<LoadedImage, EditorError> {
    let (rgba, format) = decode(bytes)?;
    let source_dimensions = rgba.dimensions();
    let (w, h) = constrain_dimensions(source_dimensions.0, source_dimensions.1, max_side);
    let rgba = if (w, h) == source_dimensions {
        rgba
    } else {
        image::imageops::resize(&rgba, w, h, FilterType::Lanczos3)
    };
    let buffer = ImageBuffer::from_raw(w, h, rgba.into_raw())?;
    Ok(LoadedImage {
        buffer,
        format,
        source_dimensions,
    })
}
