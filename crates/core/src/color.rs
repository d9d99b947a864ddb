//! Brush color type and the luminance weights used by the saturation filter.

use crate::error::EditorError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Rec. 601 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// An 8-bit sRGB color.
///
/// Serializes as a hex string `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    ///
    /// The three-digit shorthand "#f0a" is accepted as well, since color
    /// pickers and CSS emit it.
    pub fn from_hex(hex: &str) -> Result<Rgb, EditorError> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        if !digits.is_ascii() {
            return Err(EditorError::InvalidColor(format!(
                "non-ascii color string: {hex}"
            )));
        }
        let expanded: String = match digits.len() {
            6 => digits.to_owned(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            n => {
                return Err(EditorError::InvalidColor(format!(
                    "expected 3 or 6 hex digits, got {n}"
                )))
            }
        };
        let component = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&expanded[range], 16)
                .map_err(|e| EditorError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Rgb {
            r: component(0..2, "red")?,
            g: component(2..4, "green")?,
            b: component(4..6, "blue")?,
        })
    }

    /// Formats the color as `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The color as an RGBA pixel with the given alpha.
    pub fn with_alpha(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Perceived luminance `0.299R + 0.587G + 0.114B`, on the same scale as the inputs.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b
}
