//! Freehand stroke state machine and rasterizer.
//!
//! A stroke moves `Idle -> Drawing -> Idle`. Pointer-down captures a copy of
//! the brush and stamps a dot; each pointer-move rasterizes a round-capped
//! segment from the previous point to the new one, so coalesced or dropped
//! move events still leave a connected line. Pointer-up, leave or cancel
//! return to `Idle`.
//!
//! The footprint is hard-edged: a pixel is covered when its center lies
//! within half the brush diameter of the segment, and the pixels under the
//! segment's endpoints are always covered. Drawing and erasing the same path
//! therefore touch exactly the same pixels.
//!
//! A draw stroke carries a coverage mask of the pixels it has already
//! painted. Consecutive segments overlap at their joins, and the opening dot
//! overlaps the first segment; the mask keeps each pixel to a single
//! source-over per stroke so partial opacity stays uniform along the line.

use glam::Vec2;
use rayon::prelude::*;

use crate::brush::{BrushMode, BrushState};
use crate::buffer::{ImageBuffer, CHANNELS};
use crate::composite::{blend_over, destination_out};

/// Inclusive pixel bounds touched by a rasterization, already clipped to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

/// One byte per overlay pixel, non-zero once the current stroke painted it.
#[derive(Debug, Clone, PartialEq)]
struct CoverageMask {
    width: u32,
    height: u32,
    painted: Vec<u8>,
}

impl CoverageMask {
    fn for_overlay(overlay: &ImageBuffer) -> Self {
        let (width, height) = overlay.dimensions();
        Self {
            width,
            height,
            painted: vec![0; width as usize * height as usize],
        }
    }

    fn fits(&self, overlay: &ImageBuffer) -> bool {
        (self.width, self.height) == overlay.dimensions()
    }
}

/// Transient state of one pointer-down..pointer-up gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSession {
    brush: BrushState,
    last: Vec2,
    segments: usize,
    bounds: Option<PixelRect>,
    mask: Option<CoverageMask>,
}

impl StrokeSession {
    /// The brush captured at pointer-down.
    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    /// Last point in buffer space.
    pub fn last_point(&self) -> Vec2 {
        self.last
    }

    /// Number of segments appended after the initial dot.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Union of every pixel rect touched so far, if any pixel was inside the buffer.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.bounds
    }

    fn record(&mut self, touched: Option<PixelRect>) {
        if let Some(rect) = touched {
            self.bounds = Some(match self.bounds {
                Some(existing) => existing.union(rect),
                None => rect,
            });
        }
    }
}

/// Stroke state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing(StrokeSession),
}

/// Drives strokes onto an overlay buffer.
///
/// The engine does not own the overlay; every call borrows it mutably, so a
/// stroke can never race a reader of the same buffer.
#[derive(Debug, Clone, Default)]
pub struct StrokeEngine {
    state: StrokeState,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &StrokeState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing(_))
    }

    /// The active stroke, if any.
    pub fn session(&self) -> Option<&StrokeSession> {
        match &self.state {
            StrokeState::Drawing(session) => Some(session),
            StrokeState::Idle => None,
        }
    }

    /// Pointer-down: snapshots `brush` and stamps a dot at `at`.
    ///
    /// A pointer-down while already drawing ends the old stroke first.
    pub fn begin(&mut self, overlay: &mut ImageBuffer, at: Vec2, brush: BrushState) -> Option<PixelRect> {
        let mut mask = match brush.mode() {
            BrushMode::Draw => Some(CoverageMask::for_overlay(overlay)),
            BrushMode::Erase => None,
        };
        let touched = rasterize(overlay, at, at, &brush, mask.as_mut());
        let mut session = StrokeSession {
            brush,
            last: at,
            segments: 0,
            bounds: None,
            mask,
        };
        session.record(touched);
        self.state = StrokeState::Drawing(session);
        touched
    }

    /// Pointer-move: connects the previous point to `to` with the captured brush.
    ///
    /// Ignored while idle.
    pub fn extend(&mut self, overlay: &mut ImageBuffer, to: Vec2) -> Option<PixelRect> {
        let StrokeState::Drawing(session) = &mut self.state else {
            return None;
        };
        let touched = rasterize(overlay, session.last, to, &session.brush, session.mask.as_mut());
        session.last = to;
        session.segments += 1;
        session.record(touched);
        touched
    }

    /// Pointer-up, leave or cancel: returns to idle and hands back the
    /// finished session.
    pub fn end(&mut self) -> Option<StrokeSession> {
        match std::mem::take(&mut self.state) {
            StrokeState::Drawing(session) => Some(session),
            StrokeState::Idle => None,
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Pixel containing `p`, if it lies inside a `w` x `h` buffer.
fn pixel_at(p: Vec2, w: u32, h: u32) -> Option<(u32, u32)> {
    let (x, y) = (p.x.floor(), p.y.floor());
    if x < 0.0 || y < 0.0 || x >= w as f32 || y >= h as f32 {
        return None;
    }
    Some((x as u32, y as u32))
}

/// Rasterizes one round-capped segment of `brush` from `a` to `b` onto
/// `overlay`. Returns the clipped pixel bounds, or `None` when the segment
/// misses the buffer entirely.
///
/// Every covered pixel is blended once, as if the segment were its own stroke.
pub fn rasterize_segment(overlay: &mut ImageBuffer, a: Vec2, b: Vec2, brush: &BrushState) -> Option<PixelRect> {
    rasterize(overlay, a, b, brush, None)
}

/// Rasterizes a segment, skipping draw pixels already set in `mask`.
///
/// Returns the bounds of the pixels written by this call.
fn rasterize(
    overlay: &mut ImageBuffer,
    a: Vec2,
    b: Vec2,
    brush: &BrushState,
    mask: Option<&mut CoverageMask>,
) -> Option<PixelRect> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let (w, h) = overlay.dimensions();
    let radius = brush.radius();

    // Bounding box in float space, expanded by one pixel to include the
    // always-covered endpoint pixels.
    let lo = a.min(b) - Vec2::splat(radius + 1.0);
    let hi = a.max(b) + Vec2::splat(radius + 1.0);
    if hi.x < 0.0 || hi.y < 0.0 || lo.x >= w as f32 || lo.y >= h as f32 {
        return None;
    }
    let x0 = lo.x.floor().max(0.0) as u32;
    let y0 = lo.y.floor().max(0.0) as u32;
    let x1 = (hi.x.ceil() as u32).min(w - 1);
    let y1 = (hi.y.ceil() as u32).min(h - 1);

    let endpoints = [pixel_at(a, w, h), pixel_at(b, w, h)];
    let covered = |x: u32, y: u32| {
        let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        distance_to_segment(center, a, b) <= radius || endpoints.contains(&Some((x, y)))
    };

    let mode = brush.mode();
    let rgb = [brush.color().r, brush.color().g, brush.color().b];
    let opacity = brush.opacity();
    let mask_width = w as usize;
    let row_range = y0 as usize * mask_width..(y1 as usize + 1) * mask_width;
    let mut scratch;
    let painted: &mut [u8] = match mask {
        Some(mask) if mask.fits(overlay) => &mut mask.painted[row_range],
        _ => {
            scratch = vec![0u8; row_range.len()];
            &mut scratch
        }
    };
    let stride = overlay.stride();
    let rows = &mut overlay.data_mut()[y0 as usize * stride..(y1 as usize + 1) * stride];

    let touched: Vec<Option<PixelRect>> = rows
        .par_chunks_mut(stride)
        .zip(painted.par_chunks_mut(mask_width))
        .enumerate()
        .map(|(row_idx, (row, painted_row))| {
            let y = y0 + row_idx as u32;
            let mut span: Option<(u32, u32)> = None;
            for x in x0..=x1 {
                if !covered(x, y) {
                    continue;
                }
                if mode == BrushMode::Draw {
                    let seen = &mut painted_row[x as usize];
                    if *seen != 0 {
                        continue;
                    }
                    *seen = 1;
                }
                let pi = x as usize * CHANNELS;
                let px = [row[pi], row[pi + 1], row[pi + 2], row[pi + 3]];
                let out = match mode {
                    BrushMode::Draw => blend_over(px, rgb, opacity),
                    BrushMode::Erase => destination_out(px, 1.0),
                };
                row[pi..pi + CHANNELS].copy_from_slice(&out);
                span = Some(span.map_or((x, x), |(s, _)| (s, x)));
            }
            span.map(|(sx, ex)| PixelRect {
                x0: sx,
                y0: y,
                x1: ex,
                y1: y,
            })
        })
        .collect();

    touched.into_iter().flatten().reduce(PixelRect::union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn red_brush(size: f32) -> BrushState {
        BrushState::new(RED, size, BrushMode::Draw)
    }

    fn alpha_at(buf: &ImageBuffer, x: u32, y: u32) -> u8 {
        buf.pixel(x, y).unwrap()[3]
    }

    #[test]
    fn engine_starts_idle() {
        let engine = StrokeEngine::new();
        assert!(!engine.is_drawing());
        assert_eq!(engine.state(), &StrokeState::Idle);
    }

    #[test]
    fn tap_leaves_a_dot_of_brush_diameter() {
        let mut overlay = ImageBuffer::new(40, 40).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::new(20.0, 20.0), red_brush(10.0));
        engine.end();

        assert_eq!(overlay.pixel(20, 20), Some(RED.with_alpha(255)));
        // 4.5px from the center is inside a 10px dot, 6.5px is outside.
        assert_eq!(alpha_at(&overlay, 24, 20), 255);
        assert_eq!(alpha_at(&overlay, 26, 20), 0);
        assert_eq!(alpha_at(&overlay, 20, 13), 0);
    }

    #[test]
    fn one_pixel_tap_always_marks_a_pixel() {
        let mut overlay = ImageBuffer::new(8, 8).unwrap();
        let mut engine = StrokeEngine::new();
        // A corner point is 0.7px from every neighbouring center.
        engine.begin(&mut overlay, Vec2::new(3.0, 3.0), red_brush(1.0));
        assert_eq!(alpha_at(&overlay, 3, 3), 255);
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let mut overlay = ImageBuffer::new(10, 10).unwrap();
        let mut engine = StrokeEngine::new();
        assert!(engine.extend(&mut overlay, Vec2::new(5.0, 5.0)).is_none());
        assert!(overlay.is_transparent());
    }

    #[test]
    fn sparse_moves_still_form_a_connected_line() {
        let mut overlay = ImageBuffer::new(100, 10).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::new(5.0, 5.0), red_brush(2.0));
        engine.extend(&mut overlay, Vec2::new(95.0, 5.0));
        for x in 5..95 {
            assert_eq!(alpha_at(&overlay, x, 5), 255, "gap at x={x}");
        }
    }

    #[test]
    fn brush_snapshot_survives_mid_stroke_tool_change() {
        let mut overlay = ImageBuffer::new(30, 30).unwrap();
        let mut engine = StrokeEngine::new();
        let mut brush = red_brush(4.0);
        engine.begin(&mut overlay, Vec2::new(5.0, 5.0), brush);
        brush.set_color(Rgb::new(0, 0, 255));
        brush.set_mode(BrushMode::Erase);
        engine.extend(&mut overlay, Vec2::new(25.0, 5.0));
        assert_eq!(overlay.pixel(20, 5), Some(RED.with_alpha(255)));
        assert_eq!(engine.session().unwrap().brush().color(), RED);
    }

    #[test]
    fn end_returns_session_and_goes_idle() {
        let mut overlay = ImageBuffer::new(30, 30).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::new(5.0, 5.0), red_brush(4.0));
        engine.extend(&mut overlay, Vec2::new(10.0, 5.0));
        engine.extend(&mut overlay, Vec2::new(15.0, 5.0));
        let session = engine.end().unwrap();
        assert_eq!(session.segments(), 2);
        assert_eq!(session.last_point(), Vec2::new(15.0, 5.0));
        let bounds = session.bounds().unwrap();
        assert!(bounds.contains(5, 5) && bounds.contains(15, 5));
        assert!(!engine.is_drawing());
        assert!(engine.end().is_none());
    }

    #[test]
    fn segments_outside_the_buffer_are_clipped() {
        let mut overlay = ImageBuffer::new(20, 20).unwrap();
        let mut engine = StrokeEngine::new();
        assert!(engine
            .begin(&mut overlay, Vec2::new(-100.0, -100.0), red_brush(10.0))
            .is_none());
        engine.extend(&mut overlay, Vec2::new(-50.0, 500.0));
        assert!(overlay.is_transparent());

        let touched = engine.extend(&mut overlay, Vec2::new(10.0, 10.0)).unwrap();
        assert!(touched.x1 < 20 && touched.y1 < 20);
        assert_eq!(alpha_at(&overlay, 10, 10), 255);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut overlay = ImageBuffer::new(10, 10).unwrap();
        let brush = red_brush(4.0);
        assert!(rasterize_segment(&mut overlay, Vec2::NAN, Vec2::ONE, &brush).is_none());
        assert!(overlay.is_transparent());
    }

    #[test]
    fn erase_removes_only_drawn_pixels() {
        let mut overlay = ImageBuffer::new(60, 60).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::ZERO, red_brush(10.0));
        engine.extend(&mut overlay, Vec2::new(50.0, 50.0));
        engine.end();
        assert!(alpha_at(&overlay, 25, 25) > 0);

        let eraser = red_brush(10.0).with_mode(BrushMode::Erase);
        engine.begin(&mut overlay, Vec2::ZERO, eraser);
        engine.extend(&mut overlay, Vec2::new(50.0, 50.0));
        engine.end();
        assert!(overlay.is_transparent());
    }

    #[test]
    fn erase_on_empty_overlay_keeps_alpha_zero() {
        let mut overlay = ImageBuffer::new(20, 20).unwrap();
        let eraser = BrushState::default().with_mode(BrushMode::Erase).with_size(30.0);
        rasterize_segment(&mut overlay, Vec2::new(0.0, 0.0), Vec2::new(19.0, 19.0), &eraser);
        assert!(overlay.is_transparent());
    }

    #[test]
    fn half_opacity_draw_blends_onto_empty_overlay() {
        let mut overlay = ImageBuffer::new(10, 10).unwrap();
        let brush = red_brush(4.0).with_opacity(0.5);
        rasterize_segment(&mut overlay, Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), &brush);
        assert_eq!(overlay.pixel(5, 5), Some(RED.with_alpha(128)));
    }

    #[test]
    fn translucent_stroke_blends_joins_and_start_once() {
        let mut overlay = ImageBuffer::new(32, 12).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::new(5.0, 5.5), red_brush(4.0).with_opacity(0.5));
        engine.extend(&mut overlay, Vec2::new(15.0, 5.5));
        engine.extend(&mut overlay, Vec2::new(25.0, 5.5));
        engine.end();

        let half = RED.with_alpha(128);
        assert_eq!(overlay.pixel(10, 5), Some(half), "mid-segment");
        assert_eq!(overlay.pixel(15, 5), Some(half), "join");
        assert_eq!(overlay.pixel(5, 5), Some(half), "start dot");
        assert_eq!(overlay.pixel(25, 5), Some(half), "end");
    }

    #[test]
    fn separate_strokes_on_one_path_compose() {
        let mut overlay = ImageBuffer::new(20, 20).unwrap();
        let mut engine = StrokeEngine::new();
        let brush = red_brush(2.0).with_opacity(0.5);
        for _ in 0..2 {
            engine.begin(&mut overlay, Vec2::new(2.0, 10.5), brush);
            engine.extend(&mut overlay, Vec2::new(18.0, 10.5));
            engine.end();
        }
        let twice = crate::composite::blend_over(RED.with_alpha(128), [255, 0, 0], 0.5);
        assert_eq!(overlay.pixel(10, 10), Some(twice));
        assert!(twice[3] > 128);
    }

    #[test]
    fn backtracking_stroke_does_not_darken_its_own_path() {
        let mut overlay = ImageBuffer::new(30, 10).unwrap();
        let mut engine = StrokeEngine::new();
        engine.begin(&mut overlay, Vec2::new(3.0, 5.5), red_brush(3.0).with_opacity(0.25));
        engine.extend(&mut overlay, Vec2::new(25.0, 5.5));
        engine.extend(&mut overlay, Vec2::new(3.0, 5.5));
        let session = engine.end().unwrap();
        assert_eq!(session.segments(), 2);
        for x in 3..=25 {
            assert_eq!(alpha_at(&overlay, x, 5), 64, "x={x}");
        }
    }

    #[test]
    fn standalone_segments_blend_independently() {
        let mut overlay = ImageBuffer::new(10, 10).unwrap();
        let brush = red_brush(4.0).with_opacity(0.5);
        let p = Vec2::new(5.0, 5.0);
        rasterize_segment(&mut overlay, p, p, &brush);
        rasterize_segment(&mut overlay, p, p, &brush);
        let twice = crate::composite::blend_over(RED.with_alpha(128), [255, 0, 0], 0.5);
        assert_eq!(overlay.pixel(5, 5), Some(twice));
    }

    #[test]
    fn distance_to_degenerate_segment_is_point_distance() {
        let d = distance_to_segment(Vec2::new(3.0, 4.0), Vec2::ZERO, Vec2::ZERO);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn distance_past_segment_end_uses_round_cap() {
        let d = distance_to_segment(Vec2::new(13.0, 4.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn erasing_never_creates_alpha(
                ax in -50f32..80.0, ay in -50f32..80.0,
                bx in -50f32..80.0, by in -50f32..80.0,
                size in 1f32..60.0,
            ) {
                let mut overlay = ImageBuffer::new(32, 32).unwrap();
                let eraser = BrushState::default().with_mode(BrushMode::Erase).with_size(size);
                rasterize_segment(&mut overlay, Vec2::new(ax, ay), Vec2::new(bx, by), &eraser);
                prop_assert!(overlay.is_transparent());
            }

            #[test]
            fn translucent_polyline_has_uniform_alpha(
                pts in proptest::collection::vec((0f32..40.0, 0f32..40.0), 1..6),
                size in 1f32..12.0,
            ) {
                let mut overlay = ImageBuffer::new(40, 40).unwrap();
                let mut engine = StrokeEngine::new();
                let brush = red_brush(size).with_opacity(0.5);
                let mut points = pts.into_iter().map(|(x, y)| Vec2::new(x, y));
                let first = points.next().unwrap();
                engine.begin(&mut overlay, first, brush);
                for p in points {
                    engine.extend(&mut overlay, p);
                }
                engine.end();
                for px in overlay.data().chunks_exact(4) {
                    prop_assert!(px[3] == 0 || px[3] == 128, "alpha {}", px[3]);
                }
            }

            #[test]
            fn draw_then_erase_same_path_clears(
                ax in 0f32..32.0, ay in 0f32..32.0,
                bx in 0f32..32.0, by in 0f32..32.0,
                size in 1f32..20.0,
            ) {
                let mut overlay = ImageBuffer::new(32, 32).unwrap();
                let brush = BrushState::default().with_size(size);
                let (a, b) = (Vec2::new(ax, ay), Vec2::new(bx, by));
                rasterize_segment(&mut overlay, a, b, &brush);
                prop_assert!(!overlay.is_transparent());
                rasterize_segment(&mut overlay, a, b, &brush.with_mode(BrushMode::Erase));
                prop_assert!(overlay.is_transparent());
            }
        }
    }
}
