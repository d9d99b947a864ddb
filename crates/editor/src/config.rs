//! Session configuration.

use retouch_core::params::param_u32;
use retouch_core::BrushState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::loader::DEFAULT_MAX_SIDE;

/// Settings fixed for the lifetime of an [`EditorSession`](crate::EditorSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Longest side of the working image. Zero is treated as 1.
    pub max_side: u32,
    /// Brush restored on reset and used by new sessions.
    pub default_brush: BrushState,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            default_brush: BrushState::default(),
        }
    }
}

impl EditorConfig {
    /// Reads `max_side` and `default_brush` from a JSON object, falling back
    /// to defaults for missing or invalid keys.
    pub fn from_json(params: &Value) -> Self {
        let defaults = Self::default();
        Self {
            max_side: param_u32(params, "max_side", defaults.max_side).max(1),
            default_brush: params
                .get("default_brush")
                .map(BrushState::from_json)
                .unwrap_or(defaults.default_brush),
        }
    }

    pub fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side.max(1);
        self
    }

    pub fn with_default_brush(mut self, brush: BrushState) -> Self {
        self.default_brush = brush;
        self
    }
}
