// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay rendering for the corner editor: the zoomed source, the closed
// quadrilateral outline, and a filled marker at each corner.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use docflat_core::ScanConfig;
use docflat_core::types::Quadrilateral;

/// Stroke and marker appearance, in backing-buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub outline_width: f32,
    pub marker_radius: f32,
    pub color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl OverlayStyle {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            outline_width: config.outline_width,
            marker_radius: config.marker_radius,
            color: Rgba(config.overlay_color),
        }
    }
}

/// Draw `source` scaled by `zoom` into a buffer the size of `source`, then
/// the overlay for `quad` if there is one.
///
/// Sizes in `style` are buffer pixels, i.e. `1/zoom` of a source pixel each,
/// so the outline and markers look the same at every zoom level. Anything
/// scaled past the buffer edge is clipped; work is bounded by the buffer
/// size whatever the zoom.
pub fn render_overlay(
    source: &RgbaImage,
    quad: Option<&Quadrilateral>,
    zoom: f64,
    style: &OverlayStyle,
) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut canvas = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return canvas;
    }

    // Buffer pixel centres sample the source pixel under them.
    if let Some(projection) = zoom_projection(zoom) {
        warp_into(source, &projection, Interpolation::Nearest, Rgba([0, 0, 0, 0]), &mut canvas);
    }

    let Some(quad) = quad else {
        return canvas;
    };

    let points: Vec<(f32, f32)> = quad
        .points()
        .iter()
        .map(|p| ((p.x * zoom) as f32, (p.y * zoom) as f32))
        .collect();

    let bounds = (width as f32, height as f32);
    for i in 0..points.len() {
        let start = points[i];
        let end = points[(i + 1) % points.len()];
        stroke_segment(&mut canvas, start, end, style.outline_width, style.color, bounds);
    }

    let radius = style.marker_radius.round() as i32;
    let reach = radius as f32 + 1.0;
    for (x, y) in points {
        let near_canvas = x > -reach && y > -reach && x < bounds.0 + reach && y < bounds.1 + reach;
        if near_canvas {
            draw_filled_circle_mut(&mut canvas, (x.round() as i32, y.round() as i32), radius, style.color);
        }
    }

    canvas
}

/// Source-index to buffer-index scaling about pixel centres, or `None` for
/// a zoom `imageproc` cannot invert.
fn zoom_projection(zoom: f64) -> Option<Projection> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return None;
    }
    let z = zoom as f32;
    let offset = (z - 1.0) / 2.0;
    Projection::from_matrix([z, 0.0, offset, 0.0, z, offset, 0.0, 0.0, 1.0])
}

/// A line segment `width` pixels wide, drawn as parallel one-pixel lines
/// offset along the segment normal. Each line is clipped to the canvas
/// first so far-off corners cost nothing.
fn stroke_segment(
    canvas: &mut RgbaImage,
    start: (f32, f32),
    end: (f32, f32),
    width: f32,
    color: Rgba<u8>,
    bounds: (f32, f32),
) {
    if !(start.0.is_finite() && start.1.is_finite() && end.0.is_finite() && end.1.is_finite()) {
        return;
    }
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.hypot(dy);
    let (nx, ny) = if length > f32::EPSILON {
        (-dy / length, dx / length)
    } else {
        (0.0, 0.0)
    };

    let passes = width.ceil().max(1.0) as i32;
    let centre = (passes - 1) as f32 / 2.0;
    for k in 0..passes {
        let offset = k as f32 - centre;
        let a = (start.0 + nx * offset, start.1 + ny * offset);
        let b = (end.0 + nx * offset, end.1 + ny * offset);
        if let Some((a, b)) = clip_segment(a, b, bounds) {
            draw_line_segment_mut(canvas, a, b, color);
        }
    }
}

/// Liang-Barsky clip of `a`-`b` to the canvas grown by one pixel on each
/// side. `None` when the segment misses it entirely.
fn clip_segment(a: (f32, f32), b: (f32, f32), bounds: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
    let (min_x, min_y, max_x, max_y) = (-1.0, -1.0, bounds.0 + 1.0, bounds.1 + 1.0);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-dx, a.0 - min_x),
        (dx, max_x - a.0),
        (-dy, a.1 - min_y),
        (dy, max_y - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}
