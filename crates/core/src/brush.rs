//! Brush settings: color, size, opacity and the draw/erase mode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgb;
use crate::params::{param_color, param_f32, param_mode};

/// Inclusive brush diameter range in buffer pixels enforced at render time.
pub const BRUSH_SIZE_RANGE: (f32, f32) = (1.0, 200.0);
/// Largest diameter a size slider usually offers. Hosts may ignore it; the
/// engine only enforces [`BRUSH_SIZE_RANGE`].
pub const BRUSH_SIZE_UI_MAX: f32 = 80.0;
/// Diameter of a freshly created brush.
pub const DEFAULT_BRUSH_SIZE: f32 = 10.0;

fn clamp_size(size: f32) -> f32 {
    if size.is_nan() {
        return DEFAULT_BRUSH_SIZE;
    }
    size.clamp(BRUSH_SIZE_RANGE.0, BRUSH_SIZE_RANGE.1)
}

fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return 1.0;
    }
    opacity.clamp(0.0, 1.0)
}

/// How a stroke is composited onto the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushMode {
    /// Source-over: paint the brush color onto the overlay.
    #[default]
    Draw,
    /// Destination-out: remove overlay alpha under the brush.
    Erase,
}

/// Active brush settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBrushState")]
pub struct BrushState {
    color: Rgb,
    size: f32,
    opacity: f32,
    mode: BrushMode,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawBrushState {
    color: Rgb,
    size: f32,
    opacity: f32,
    mode: BrushMode,
}

impl Default for RawBrushState {
    fn default() -> Self {
        let d = BrushState::default();
        Self {
            color: d.color,
            size: d.size,
            opacity: d.opacity,
            mode: d.mode,
        }
    }
}

impl From<RawBrushState> for BrushState {
    fn from(raw: RawBrushState) -> Self {
        BrushState::new(raw.color, raw.size, raw.mode).with_opacity(raw.opacity)
    }
}

impl Default for BrushState {
    /// White, 10px, fully opaque, draw mode.
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            size: DEFAULT_BRUSH_SIZE,
            opacity: 1.0,
            mode: BrushMode::Draw,
        }
    }
}

impl BrushState {
    /// Creates a fully opaque brush, clamping `size` to [1, 200].
    pub fn new(color: Rgb, size: f32, mode: BrushMode) -> Self {
        Self {
            color,
            size: clamp_size(size),
            opacity: 1.0,
            mode,
        }
    }

    /// Reads `color`, `size`, `opacity` and `mode` from a JSON object,
    /// keeping `self`'s value for missing or invalid keys.
    pub fn merged_with_json(&self, params: &Value) -> Self {
        Self::new(
            param_color(params, "color", self.color),
            param_f32(params, "size", self.size),
            param_mode(params, "mode", self.mode),
        )
        .with_opacity(param_f32(params, "opacity", self.opacity))
    }

    /// Builds a brush from a JSON object, defaulting missing keys.
    pub fn from_json(params: &Value) -> Self {
        Self::default().merged_with_json(params)
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Diameter in buffer pixels, always within [1, 200].
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn mode(&self) -> BrushMode {
        self.mode
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    /// Sets the diameter, clamping to [1, 200].
    pub fn set_size(&mut self, size: f32) {
        self.size = clamp_size(size);
    }

    /// Sets the draw opacity, clamping to [0, 1]. Erasing ignores it.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_opacity(opacity);
    }

    pub fn set_mode(&mut self, mode: BrushMode) {
        self.mode = mode;
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.set_color(color);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_mode(mut self, mode: BrushMode) -> Self {
        self.set_mode(mode);
        self
    }
}
