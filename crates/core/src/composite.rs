//! Flattening the overlay layer onto the base layer.
//!
//! Both the live preview and the export go through [`composite`], so what is
//! exported is byte-for-byte what was shown.

use rayon::prelude::*;

use crate::buffer::{ImageBuffer, CHANNELS};
use crate::error::EditorError;

/// Straight-alpha source-over of `src` onto `dst`.
///
/// A transparent `src` leaves `dst` untouched; an opaque `src` replaces it.
#[inline]
pub fn source_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    match src[3] {
        0 => dst,
        255 => src,
        a => blend_over(dst, [src[0], src[1], src[2]], a as f32 / 255.0),
    }
}

/// Source-over of a color at fractional alpha `alpha` in [0, 1] onto `dst`.
pub fn blend_over(dst: [u8; 4], rgb: [u8; 3], alpha: f32) -> [u8; 4] {
    let sa = alpha.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (rgb[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

/// Destination-out: scales `dst` alpha by `1 - coverage`.
///
/// Alpha only ever decreases and bottoms out at zero, at which point the
/// pixel is reset to transparent black.
#[inline]
pub fn destination_out(dst: [u8; 4], coverage: f32) -> [u8; 4] {
    let keep = 1.0 - coverage.clamp(0.0, 1.0);
    let a = (dst[3] as f32 * keep).round() as u8;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [dst[0], dst[1], dst[2], a]
}

/// Alpha-composites `overlay` over `base`, returning a new buffer.
///
/// Returns `EditorError::DimensionMismatch` if the layers differ in size.
pub fn composite(base: &ImageBuffer, overlay: &ImageBuffer) -> Result<ImageBuffer, EditorError> {
    base.ensure_same_size(overlay)?;
    let stride = base.stride();
    let mut out = base.clone();
    out.data_mut()
        .par_chunks_mut(stride)
        .zip(overlay.data().par_chunks(stride))
        .for_each(|(row_out, row_top)| {
            for (px, top) in row_out
                .chunks_exact_mut(CHANNELS)
                .zip(row_top.chunks_exact(CHANNELS))
            {
                if top[3] == 0 {
                    continue;
                }
                let dst = [px[0], px[1], px[2], px[3]];
                let src = [top[0], top[1], top[2], top[3]];
                px.copy_from_slice(&source_over(dst, src));
            }
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_overlay_leaves_base_identical() {
        let base = ImageBuffer::filled(5, 3, [10, 20, 30, 255]).unwrap();
        let overlay = ImageBuffer::new(5, 3).unwrap();
        assert_eq!(composite(&base, &overlay).unwrap(), base);
    }

    #[test]
    fn opaque_overlay_replaces_base() {
        let base = ImageBuffer::filled(2, 2, [10, 20, 30, 255]).unwrap();
        let overlay = ImageBuffer::filled(2, 2, [255, 0, 0, 255]).unwrap();
        assert_eq!(composite(&base, &overlay).unwrap(), overlay);
    }

    #[test]
    fn half_alpha_overlay_mixes_evenly_over_opaque_base() {
        let base = ImageBuffer::filled(1, 1, [0, 0, 0, 255]).unwrap();
        let overlay = ImageBuffer::filled(1, 1, [255, 255, 255, 128]).unwrap();
        let px = composite(&base, &overlay).unwrap().pixel(0, 0).unwrap();
        assert_eq!(px, [128, 128, 128, 255]);
    }

    #[test]
    fn composite_only_touches_covered_pixels() {
        let base = ImageBuffer::filled(3, 1, [50, 50, 50, 255]).unwrap();
        let mut overlay = ImageBuffer::new(3, 1).unwrap();
        overlay.set_pixel(1, 0, [0, 255, 0, 255]);
        let out = composite(&base, &overlay).unwrap();
        assert_eq!(out.pixel(0, 0), Some([50, 50, 50, 255]));
        assert_eq!(out.pixel(1, 0), Some([0, 255, 0, 255]));
        assert_eq!(out.pixel(2, 0), Some([50, 50, 50, 255]));
    }

    #[test]
    fn composite_rejects_mismatched_layers() {
        let base = ImageBuffer::new(4, 4).unwrap();
        let overlay = ImageBuffer::new(4, 3).unwrap();
        assert!(matches!(
            composite(&base, &overlay),
            Err(EditorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn blend_over_transparent_destination_takes_source_color() {
        let px = blend_over([0, 0, 0, 0], [200, 100, 50], 0.5);
        assert_eq!(px, [200, 100, 50, 128]);
    }

    #[test]
    fn destination_out_full_coverage_clears() {
        assert_eq!(destination_out([255, 0, 0, 255], 1.0), [0, 0, 0, 0]);
    }

    #[test]
    fn destination_out_partial_coverage_keeps_color() {
        assert_eq!(destination_out([255, 0, 0, 200], 0.5), [255, 0, 0, 100]);
    }

    #[test]
    fn destination_out_on_transparent_stays_transparent() {
        assert_eq!(destination_out([0, 0, 0, 0], 1.0), [0, 0, 0, 0]);
        assert_eq!(destination_out([0, 0, 0, 0], 0.3), [0, 0, 0, 0]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn source_over_alpha_never_decreases(dst: [u8; 4], src: [u8; 4]) {
                let out = source_over(dst, src);
                prop_assert!(out[3] >= dst[3].max(src[3]));
            }

            #[test]
            fn destination_out_alpha_never_increases(dst: [u8; 4], coverage in 0f32..=1.0) {
                prop_assert!(destination_out(dst, coverage)[3] <= dst[3]);
            }
        }
    }
}
