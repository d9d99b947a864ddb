//! PNG encoding of the flattened image.

use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use retouch_core::{EditorError, ImageBuffer};

/// File name offered for downloads when the host has no better name.
pub const DEFAULT_EXPORT_NAME: &str = "ai-image.png";

/// Encodes `buffer` as an RGBA8 PNG at its working resolution.
///
/// Returns `EditorError::Encode` if the encoder fails.
pub fn encode_png(buffer: &ImageBuffer) -> Result<Vec<u8>, EditorError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            buffer.data(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EditorError::Encode(e.to_string()))?;
    Ok(out)
}

/// Encodes `buffer` as PNG and writes it to `path`.
///
/// Returns `EditorError::Encode` on encoder failure or `EditorError::Io` on
/// write failure.
pub fn write_png(buffer: &ImageBuffer, path: &Path) -> Result<(), EditorError> {
    let bytes = encode_png(buffer)?;
    std::fs::write(path, bytes).map_err(|e| EditorError::Io(format!("{}: {e}", path.display())))
}
