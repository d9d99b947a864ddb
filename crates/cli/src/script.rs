//! Stroke scripts: a JSON array of strokes replayed as pointer events.
//!
//! Each entry carries optional brush keys (`color`, `size`, `opacity`,
//! `mode`), a `points` polyline and an optional `display` rect. With a
//! display rect the points are device coordinates inside it; without one
//! they are buffer pixels. Missing brush keys keep the previous stroke's
//! value.
//!
//! ```json
//! [
//!   {"color": "#ff0000", "size": 10, "points": [[0, 0], [50, 50]]},
//!   {"mode": "erase", "points": [[0, 0], [50, 50]]}
//! ]
//! ```

use glam::Vec2;
use retouch_core::{DisplayRect, EditorError};
use retouch_editor::EditorSession;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CliError;

#[derive(Debug, Deserialize)]
pub struct StrokeSpec {
    pub points: Vec<[f32; 2]>,
    #[serde(default)]
    pub display: Option<DisplayRect>,
    #[serde(flatten)]
    pub brush: Map<String, Value>,
}

/// Parses a stroke script, rejecting strokes without points.
pub fn parse(text: &str) -> Result<Vec<StrokeSpec>, CliError> {
    let strokes: Vec<StrokeSpec> =
        serde_json::from_str(text).map_err(|e| CliError::Input(format!("invalid stroke script: {e}")))?;
    if let Some(i) = strokes.iter().position(|s| s.points.is_empty()) {
        return Err(CliError::Input(format!("stroke {i} has no points")));
    }
    Ok(strokes)
}

/// Replays `strokes` onto the session overlay. Returns the number drawn.
pub fn apply(session: &mut EditorSession, strokes: &[StrokeSpec]) -> Result<usize, CliError> {
    let dims = session.dimensions().ok_or(EditorError::NotLoaded)?;
    for spec in strokes {
        let brush = session.brush().merged_with_json(&Value::Object(spec.brush.clone()));
        session.set_brush(brush);
        let rect = spec.display.unwrap_or_else(|| DisplayRect::identity(dims));
        let mut points = spec.points.iter().map(|&[x, y]| Vec2::new(x, y));
        if let Some(first) = points.next() {
            session.pointer_down(first, &rect);
            for p in points {
                session.pointer_move(p, &rect);
            }
            session.pointer_up();
        }
    }
    Ok(strokes.len())
}
