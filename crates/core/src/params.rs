//! Lenient extraction of editor settings from a `serde_json::Value` object.
//!
//! Each helper takes a JSON value, a key name, and a default. If the key is
//! missing or the value has the wrong type, the default is returned. Range
//! checks are left to the typed setters, which clamp.

use serde_json::Value;

use crate::brush::BrushMode;
use crate::color::Rgb;

/// Extracts an `f32` from `params[name]`. Integers are accepted.
pub fn param_f32(params: &Value, name: &str, default: f32) -> f32 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

/// Extracts a `u32` from `params[name]`.
///
/// Negative numbers, floats, and values above `u32::MAX` fall back to `default`.
pub fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Extracts a hex color string from `params[name]`.
///
/// An unparseable string falls back to `default` like any other wrong value.
pub fn param_color(params: &Value, name: &str, default: Rgb) -> Rgb {
    params
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| Rgb::from_hex(s).ok())
        .unwrap_or(default)
}

/// Extracts a brush mode from `params[name]`: `"draw"` or `"erase"`, or a
/// boolean `true` meaning erase.
pub fn param_mode(params: &Value, name: &str, default: BrushMode) -> BrushMode {
    match params.get(name) {
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "draw" | "brush" => BrushMode::Draw,
            "erase" | "eraser" => BrushMode::Erase,
            _ => default,
        },
        Some(Value::Bool(true)) => BrushMode::Erase,
        Some(Value::Bool(false)) => BrushMode::Draw,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- param_f32 --

    #[test]
    fn param_f32_extracts_existing_float() {
        let params = json!({"brightness": 150.5});
        assert_eq!(param_f32(&params, "brightness", 100.0), 150.5);
    }

    #[test]
    fn param_f32_extracts_integer_as_float() {
        let params = json!({"blur": 4});
        assert_eq!(param_f32(&params, "blur", 0.0), 4.0);
    }

    #[test]
    fn param_f32_returns_default_when_key_missing() {
        let params = json!({"other": 1.0});
        assert_eq!(param_f32(&params, "contrast", 100.0), 100.0);
    }

    #[test]
    fn param_f32_returns_default_when_wrong_type() {
        let params = json!({"contrast": "high"});
        assert_eq!(param_f32(&params, "contrast", 100.0), 100.0);
    }

    #[test]
    fn param_f32_returns_default_for_non_object() {
        let params = json!([1, 2, 3]);
        assert_eq!(param_f32(&params, "blur", 7.0), 7.0);
    }

    // -- param_u32 --

    #[test]
    fn param_u32_extracts_existing_integer() {
        let params = json!({"max_side": 2048});
        assert_eq!(param_u32(&params, "max_side", 1024), 2048);
    }

    #[test]
    fn param_u32_returns_default_for_negative() {
        let params = json!({"max_side": -1});
        assert_eq!(param_u32(&params, "max_side", 1024), 1024);
    }

    #[test]
    fn param_u32_returns_default_for_overflow() {
        let params = json!({"max_side": 5_000_000_000u64});
        assert_eq!(param_u32(&params, "max_side", 1024), 1024);
    }

    #[test]
    fn param_u32_returns_default_for_float() {
        let params = json!({"max_side": 512.5});
        assert_eq!(param_u32(&params, "max_side", 1024), 1024);
    }

    // -- param_color --

    #[test]
    fn param_color_parses_hex() {
        let params = json!({"color": "#ff0000"});
        assert_eq!(param_color(&params, "color", Rgb::WHITE), Rgb::new(255, 0, 0));
    }

    #[test]
    fn param_color_falls_back_on_bad_hex() {
        let params = json!({"color": "red"});
        assert_eq!(param_color(&params, "color", Rgb::WHITE), Rgb::WHITE);
    }

    // -- param_mode --

    #[test]
    fn param_mode_accepts_names() {
        let params = json!({"a": "erase", "b": "Draw", "c": "eraser"});
        assert_eq!(param_mode(&params, "a", BrushMode::Draw), BrushMode::Erase);
        assert_eq!(param_mode(&params, "b", BrushMode::Erase), BrushMode::Draw);
        assert_eq!(param_mode(&params, "c", BrushMode::Draw), BrushMode::Erase);
    }

    #[test]
    fn param_mode_accepts_erasing_flag() {
        let params = json!({"erasing": true});
        assert_eq!(
            param_mode(&params, "erasing", BrushMode::Draw),
            BrushMode::Erase
        );
    }

    #[test]
    fn param_mode_returns_default_for_unknown() {
        let params = json!({"mode": "smudge"});
        assert_eq!(param_mode(&params, "mode", BrushMode::Draw), BrushMode::Draw);
    }
}
