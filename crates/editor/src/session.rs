//! The editor session: one loaded image, its filter settings, the brush and
//! the overlay strokes drawn on top.
//!
//! A session is either [`Lifecycle::Empty`] or [`Lifecycle::Loaded`]. While
//! loaded it holds three buffers of identical size: the pristine working
//! image, the filtered base layer rendered from it, and the transparent
//! overlay that strokes go into. Filters never touch the overlay and strokes
//! never touch the base.

use std::fmt;
use std::path::Path;

use glam::Vec2;
use image::ImageFormat;
use retouch_core::geometry::to_buffer_space;
use retouch_core::{
    composite, render, BrushMode, BrushState, DisplayRect, EditorError, FilterState, ImageBuffer,
    PixelRect, Rgb, StrokeEngine, StrokeSession,
};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::export::{encode_png, write_png};
use crate::loader;

/// Callback fired after [`EditorSession::reset`] so the host can drop its
/// own reference to the image.
pub trait ResetHook: Send {
    fn on_reset(&mut self);
}

impl<F: FnMut() + Send> ResetHook for F {
    fn on_reset(&mut self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Empty,
    Loaded,
}

#[derive(Debug, Clone)]
struct Layers {
    source: ImageBuffer,
    base: ImageBuffer,
    overlay: ImageBuffer,
    format: ImageFormat,
    source_dimensions: (u32, u32),
}

/// Owns every piece of editor state. Operations run to completion on the
/// caller's thread, so each one observes the state the previous one left.
pub struct EditorSession {
    config: EditorConfig,
    filters: FilterState,
    brush: BrushState,
    strokes: StrokeEngine,
    layers: Option<Layers>,
    reset_hook: Option<Box<dyn ResetHook>>,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("lifecycle", &self.lifecycle())
            .field("dimensions", &self.dimensions())
            .field("filters", &self.filters)
            .field("brush", &self.brush)
            .field("drawing", &self.is_drawing())
            .finish_non_exhaustive()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Creates an empty session.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            brush: config.default_brush,
            config,
            filters: FilterState::default(),
            strokes: StrokeEngine::new(),
            layers: None,
            reset_hook: None,
        }
    }

    /// Creates a session and loads `bytes` into it.
    pub fn from_bytes(bytes: &[u8], config: EditorConfig) -> Result<Self, EditorError> {
        let mut session = Self::new(config);
        session.load_image(bytes)?;
        Ok(session)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // -- loading --

    /// Decodes `bytes` and makes it the working image.
    ///
    /// The base layer is rendered with the current filters and the overlay is
    /// replaced by a transparent buffer of the new size. Any stroke in progress
    /// is dropped. On error the session is left exactly as it was.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        let loaded = match loader::load(bytes, self.config.max_side) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "image load failed");
                return Err(e);
            }
        };
        let (w, h) = loaded.buffer.dimensions();
        let overlay = ImageBuffer::new(w, h)?;
        let base = render(&loaded.buffer, &self.filters);
        self.strokes.end();
        info!(
            format = ?loaded.format,
            source_width = loaded.source_dimensions.0,
            source_height = loaded.source_dimensions.1,
            width = w,
            height = h,
            "image loaded"
        );
        self.layers = Some(Layers {
            source: loaded.buffer,
            base,
            overlay,
            format: loaded.format,
            source_dimensions: loaded.source_dimensions,
        });
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.layers.is_some() {
            Lifecycle::Loaded
        } else {
            Lifecycle::Empty
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.layers.is_some()
    }

    /// Working-image dimensions, shared by all three layers.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.source.dimensions())
    }

    /// Native dimensions of the decoded image before downscaling.
    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.source_dimensions)
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.layers.as_ref().map(|l| l.format)
    }

    /// The unfiltered working image.
    pub fn source(&self) -> Option<&ImageBuffer> {
        self.layers.as_ref().map(|l| &l.source)
    }

    /// The filtered base layer.
    pub fn base(&self) -> Option<&ImageBuffer> {
        self.layers.as_ref().map(|l| &l.base)
    }

    /// The stroke overlay.
    pub fn overlay(&self) -> Option<&ImageBuffer> {
        self.layers.as_ref().map(|l| &l.overlay)
    }

    // -- filters --

    pub fn filters(&self) -> FilterState {
        self.filters
    }

    /// Replaces the filter settings, re-rendering the base layer if they changed.
    pub fn set_filters(&mut self, filters: FilterState) {
        if filters == self.filters {
            return;
        }
        self.filters = filters;
        debug!(filter = %self.filters.css(), "filters changed");
        self.rerender();
    }

    pub fn set_brightness(&mut self, value: f32) {
        self.set_filters(self.filters.with_brightness(value));
    }

    pub fn set_contrast(&mut self, value: f32) {
        self.set_filters(self.filters.with_contrast(value));
    }

    pub fn set_saturation(&mut self, value: f32) {
        self.set_filters(self.filters.with_saturation(value));
    }

    pub fn set_blur(&mut self, value: f32) {
        self.set_filters(self.filters.with_blur(value));
    }

    fn rerender(&mut self) {
        if let Some(layers) = self.layers.as_mut() {
            layers.base = render(&layers.source, &self.filters);
        }
    }

    // -- brush --

    pub fn brush(&self) -> BrushState {
        self.brush
    }

    /// Replaces the brush. A stroke in progress keeps the brush it began with.
    pub fn set_brush(&mut self, brush: BrushState) {
        self.brush = brush;
    }

    pub fn set_brush_color(&mut self, color: Rgb) {
        self.brush.set_color(color);
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush.set_size(size);
    }

    pub fn set_brush_opacity(&mut self, opacity: f32) {
        self.brush.set_opacity(opacity);
    }

    pub fn set_brush_mode(&mut self, mode: BrushMode) {
        self.brush.set_mode(mode);
    }

    // -- pointer input --

    /// Starts a stroke at `device`, stamping a single dab.
    ///
    /// Ignored while the session is empty. Returns the overlay region touched.
    pub fn pointer_down(&mut self, device: Vec2, rect: &DisplayRect) -> Option<PixelRect> {
        let layers = self.layers.as_mut()?;
        let at = to_buffer_space(device, rect, layers.overlay.dimensions());
        debug!(x = at.x, y = at.y, mode = ?self.brush.mode(), "stroke begin");
        self.strokes.begin(&mut layers.overlay, at, self.brush)
    }

    /// Extends the current stroke to `device`. Ignored when no stroke is active.
    pub fn pointer_move(&mut self, device: Vec2, rect: &DisplayRect) -> Option<PixelRect> {
        let layers = self.layers.as_mut()?;
        let to = to_buffer_space(device, rect, layers.overlay.dimensions());
        self.strokes.extend(&mut layers.overlay, to)
    }

    /// Ends the current stroke, returning what it did.
    pub fn pointer_up(&mut self) -> Option<StrokeSession> {
        let session = self.strokes.end()?;
        debug!(segments = session.segments(), bounds = ?session.bounds(), "stroke end");
        Some(session)
    }

    /// Pointer left the surface or the gesture was cancelled. Pixels already
    /// drawn stay.
    pub fn pointer_cancel(&mut self) -> Option<StrokeSession> {
        self.pointer_up()
    }

    pub fn is_drawing(&self) -> bool {
        self.strokes.is_drawing()
    }

    // -- output --

    /// The flattened image: overlay composited over the base layer.
    ///
    /// Returns `EditorError::NotLoaded` while empty.
    pub fn preview(&self) -> Result<ImageBuffer, EditorError> {
        let layers = self.layers.as_ref().ok_or(EditorError::NotLoaded)?;
        composite(&layers.base, &layers.overlay)
    }

    /// Encodes the flattened image as PNG at working resolution.
    pub fn export_raster(&self) -> Result<Vec<u8>, EditorError> {
        let flat = self.preview()?;
        let bytes = encode_png(&flat)?;
        info!(width = flat.width(), height = flat.height(), bytes = bytes.len(), "exported");
        Ok(bytes)
    }

    /// Writes the flattened image to `path` as PNG.
    pub fn export_to_path(&self, path: &Path) -> Result<(), EditorError> {
        let flat = self.preview()?;
        write_png(&flat, path)?;
        info!(path = %path.display(), "exported");
        Ok(())
    }

    // -- reset --

    /// Registers the callback fired by [`reset`](Self::reset), replacing any
    /// previous one.
    pub fn set_reset_hook(&mut self, hook: impl ResetHook + 'static) {
        self.reset_hook = Some(Box::new(hook));
    }

    /// Restores default filters and brush, clears the overlay, notifies the
    /// reset hook and returns the session to [`Lifecycle::Empty`].
    ///
    /// Returns the pristine working image as it renders under default
    /// filters with an empty overlay, or `None` if nothing was loaded. The
    /// hook fires either way.
    pub fn reset(&mut self) -> Option<ImageBuffer> {
        self.strokes.end();
        self.filters = FilterState::default();
        self.brush = self.config.default_brush;
        let restored = self.layers.take().map(|mut layers| {
            layers.overlay.clear();
            layers.base = render(&layers.source, &self.filters);
            layers.base
        });
        info!(had_image = restored.is_some(), "editor reset");
        if let Some(hook) = self.reset_hook.as_mut() {
            hook.on_reset();
        }
        restored
    }
}
