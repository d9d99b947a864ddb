//! Tonal filters applied to the source image to produce the base layer.
//!
//! [`render`] applies brightness, contrast, saturation and blur in that
//! fixed order, the same order a display-filter chain
//! `brightness() contrast() saturate() blur()` composes them. It is a pure
//! function of its inputs: the overlay layer never passes through here.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffer::{ImageBuffer, CHANNELS};
use crate::color::luminance;
use crate::params::param_f32;

/// Inclusive range for brightness, contrast and saturation, in percent.
pub const PERCENT_RANGE: (f32, f32) = (0.0, 200.0);
/// Inclusive range for the blur radius, in pixels.
pub const BLUR_RANGE: (f32, f32) = (0.0, 20.0);

const IDENTITY_PERCENT: f32 = 100.0;

fn clamp_percent(v: f32) -> f32 {
    if v.is_nan() {
        return IDENTITY_PERCENT;
    }
    v.clamp(PERCENT_RANGE.0, PERCENT_RANGE.1)
}

fn clamp_blur(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(BLUR_RANGE.0, BLUR_RANGE.1)
}

/// Current filter parameters. `100/100/100/0` is the identity.
///
/// Every setter clamps to the valid range, so a `FilterState` is always
/// within bounds; out-of-range input is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFilterState")]
pub struct FilterState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
}

/// Unvalidated mirror of [`FilterState`] used for deserialization.
#[derive(Deserialize)]
#[serde(default)]
struct RawFilterState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
}

impl Default for RawFilterState {
    fn default() -> Self {
        let d = FilterState::default();
        Self {
            brightness: d.brightness,
            contrast: d.contrast,
            saturation: d.saturation,
            blur: d.blur,
        }
    }
}

impl From<RawFilterState> for FilterState {
    fn from(raw: RawFilterState) -> Self {
        FilterState::new(raw.brightness, raw.contrast, raw.saturation, raw.blur)
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brightness: IDENTITY_PERCENT,
            contrast: IDENTITY_PERCENT,
            saturation: IDENTITY_PERCENT,
            blur: 0.0,
        }
    }
}

impl FilterState {
    /// Creates a filter state, clamping each value into its range.
    pub fn new(brightness: f32, contrast: f32, saturation: f32, blur: f32) -> Self {
        Self {
            brightness: clamp_percent(brightness),
            contrast: clamp_percent(contrast),
            saturation: clamp_percent(saturation),
            blur: clamp_blur(blur),
        }
    }

    /// Reads `brightness`, `contrast`, `saturation` and `blur` from a JSON
    /// object, keeping `self`'s value for any key that is missing or invalid.
    pub fn merged_with_json(&self, params: &Value) -> Self {
        Self::new(
            param_f32(params, "brightness", self.brightness),
            param_f32(params, "contrast", self.contrast),
            param_f32(params, "saturation", self.saturation),
            param_f32(params, "blur", self.blur),
        )
    }

    /// Builds a filter state from a JSON object, defaulting missing keys.
    pub fn from_json(params: &Value) -> Self {
        Self::default().merged_with_json(params)
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    /// Sets brightness in percent, clamping to [0, 200].
    pub fn set_brightness(&mut self, v: f32) {
        self.brightness = clamp_percent(v);
    }

    /// Sets contrast in percent, clamping to [0, 200].
    pub fn set_contrast(&mut self, v: f32) {
        self.contrast = clamp_percent(v);
    }

    /// Sets saturation in percent, clamping to [0, 200].
    pub fn set_saturation(&mut self, v: f32) {
        self.saturation = clamp_percent(v);
    }

    /// Sets the blur radius in pixels, clamping to [0, 20].
    pub fn set_blur(&mut self, v: f32) {
        self.blur = clamp_blur(v);
    }

    pub fn with_brightness(mut self, v: f32) -> Self {
        self.set_brightness(v);
        self
    }

    pub fn with_contrast(mut self, v: f32) -> Self {
        self.set_contrast(v);
        self
    }

    pub fn with_saturation(mut self, v: f32) -> Self {
        self.set_saturation(v);
        self
    }

    pub fn with_blur(mut self, v: f32) -> Self {
        self.set_blur(v);
        self
    }

    /// True when rendering with these filters returns the source unchanged.
    pub fn is_identity(&self) -> bool {
        !self.has_color_adjustment() && self.blur == 0.0
    }

    fn has_color_adjustment(&self) -> bool {
        self.brightness != IDENTITY_PERCENT
            || self.contrast != IDENTITY_PERCENT
            || self.saturation != IDENTITY_PERCENT
    }

    /// The equivalent display-filter string, e.g.
    /// `brightness(150%) contrast(100%) saturate(100%) blur(0px)`.
    pub fn css(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) blur({}px)",
            self.brightness, self.contrast, self.saturation, self.blur
        )
    }
}

/// Renders the base layer: `source` with `filters` applied.
///
/// Deterministic and side-effect free. Identity filters yield an exact copy.
/// Alpha passes through the color filters untouched.
pub fn render(source: &ImageBuffer, filters: &FilterState) -> ImageBuffer {
    let mut out = if filters.has_color_adjustment() {
        adjust_colors(source, filters)
    } else {
        source.clone()
    };
    if filters.blur > 0.0 {
        out = gaussian_blur(&out, filters.blur);
    }
    out
}

/// Per-channel brightness, then contrast, then saturation.
///
/// Each step clamps to [0, 255]; rounding happens once at the end. Steps at
/// 100% are skipped so they stay exact.
fn adjust_pixel(rgb: [f32; 3], filters: &FilterState) -> [f32; 3] {
    let mut rgb = rgb;
    if filters.brightness != IDENTITY_PERCENT {
        let brightness = filters.brightness / 100.0;
        rgb = rgb.map(|v| (v * brightness).clamp(0.0, 255.0));
    }
    if filters.contrast != IDENTITY_PERCENT {
        let contrast = filters.contrast / 100.0;
        rgb = rgb.map(|v| ((v - 128.0) * contrast + 128.0).clamp(0.0, 255.0));
    }
    if filters.saturation != IDENTITY_PERCENT {
        let saturation = filters.saturation / 100.0;
        let l = luminance(rgb[0], rgb[1], rgb[2]);
        rgb = rgb.map(|v| (l + (v - l) * saturation).clamp(0.0, 255.0));
    }
    rgb
}

fn adjust_colors(source: &ImageBuffer, filters: &FilterState) -> ImageBuffer {
    let stride = source.stride();
    let mut out = source.clone();
    out.data_mut()
        .par_chunks_mut(stride)
        .zip(source.data().par_chunks(stride))
        .for_each(|(row_out, row_in)| {
            for (px_out, px_in) in row_out
                .chunks_exact_mut(CHANNELS)
                .zip(row_in.chunks_exact(CHANNELS))
            {
                let rgb = [px_in[0] as f32, px_in[1] as f32, px_in[2] as f32];
                let [r, g, b] = adjust_pixel(rgb, filters);
                px_out[0] = r.round() as u8;
                px_out[1] = g.round() as u8;
                px_out[2] = b.round() as u8;
            }
        });
    out
}

/// Normalized 1-D Gaussian kernel with radius `ceil(3 * sigma)`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian blur with clamped edges, computed on premultiplied alpha
/// so transparent pixels do not bleed their color into neighbours.
fn gaussian_blur(source: &ImageBuffer, sigma: f32) -> ImageBuffer {
    let w = source.width() as usize;
    let h = source.height() as usize;
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    let premul: Vec<[f32; 4]> = source
        .data()
        .chunks_exact(CHANNELS)
        .map(|px| {
            let a = px[3] as f32 / 255.0;
            [
                px[0] as f32 * a,
                px[1] as f32 * a,
                px[2] as f32 * a,
                px[3] as f32,
            ]
        })
        .collect();

    let mut horizontal = vec![[0.0f32; 4]; w * h];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &premul[y * w..(y + 1) * w];
            for (x, acc) in row.iter_mut().enumerate() {
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                    for c in 0..4 {
                        acc[c] += src_row[sx][c] * weight;
                    }
                }
            }
        });

    let mut out = source.clone();
    out.data_mut()
        .par_chunks_mut(w * CHANNELS)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                    let px = horizontal[sy * w + x];
                    for c in 0..4 {
                        acc[c] += px[c] * weight;
                    }
                }
                let a = acc[3].clamp(0.0, 255.0);
                let pi = x * CHANNELS;
                if a < 0.5 {
                    row_out[pi..pi + CHANNELS].fill(0);
                    continue;
                }
                let unpremul = 255.0 / a;
                for c in 0..3 {
                    row_out[pi + c] = (acc[c] * unpremul).round().clamp(0.0, 255.0) as u8;
                }
                row_out[pi + 3] = a.round() as u8;
            }
        });
    out
}
