#![deny(unsafe_code)]
//! Core types for the retouch two-layer image editor.
//!
//! Provides the RGBA8 [`ImageBuffer`], the tonal [`filter`] pipeline that
//! turns a source image into the base layer, the [`stroke`] engine that
//! rasterizes brush and eraser strokes onto the overlay layer, the
//! display-to-buffer [`geometry`] mapping, and the [`composite`] step that
//! flattens overlay over base. Everything here is pure computation on owned
//! or exclusively borrowed buffers; decoding and encoding live in
//! `retouch-editor`.

pub mod brush;
pub mod buffer;
pub mod color;
pub mod composite;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod params;
pub mod stroke;

pub use brush::{BrushMode, BrushState};
pub use buffer::ImageBuffer;
pub use color::Rgb;
pub use composite::composite;
pub use error::EditorError;
pub use filter::{render, FilterState};
pub use geometry::{to_buffer_space, DisplayRect};
pub use stroke::{PixelRect, StrokeEngine, StrokeSession, StrokeState};
