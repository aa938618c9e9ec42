// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-triangle piecewise-affine rectification — flattens the user-adjusted
// document quadrilateral into an upright rectangle sized from its edges.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use docflat_core::ScanConfig;
use docflat_core::error::{DocflatError, Result};
use docflat_core::types::{Point, Quadrilateral};
use tracing::{debug, info, instrument};

use crate::geometry::{AffineTransform, Triangle};

/// Edge index of the `tl`–`br` diagonal within the second triangle. That
/// triangle leaves the diagonal to the first so no pixel is written twice.
const SHARED_DIAGONAL_EDGE: usize = 0;

/// Largest output buffer `rectify` will allocate, in bytes (1 GiB of RGBA).
pub const MAX_OUTPUT_BYTES: u64 = 1 << 30;

/// Replicated border added around the source so bilinear taps at the last
/// row and column stay inside the buffer.
const SOURCE_PAD: u32 = 1;

/// The flattened document produced by [`Rectifier::rectify`].
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    image: RgbaImage,
}

impl RectifiedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// One half of the piecewise warp.
#[derive(Debug, Clone, Copy)]
pub struct TriangleWarp {
    /// Vertices in source-image space.
    pub source: Triangle,
    /// Matching vertices in output space.
    pub dest: Triangle,
    /// Source → output.
    pub forward: AffineTransform,
    /// Output → source; resolves each output pixel to its source sample.
    pub inverse: AffineTransform,
}

impl TriangleWarp {
    fn solve(source: Triangle, dest: Triangle) -> Result<Self> {
        Ok(Self {
            source,
            dest,
            forward: AffineTransform::from_triangles(&source, &dest)?,
            inverse: AffineTransform::from_triangles(&dest, &source)?,
        })
    }

    /// Projection from padded-source pixel indices to output pixel indices.
    ///
    /// The affine solve works on continuous coordinates where pixel `i`
    /// covers `[i, i + 1)`; `imageproc` samples at integer indices. Both
    /// sides are moved to pixel centres here, and the source side also
    /// absorbs the padding offset.
    fn projection(&self) -> Result<Projection> {
        let half = 0.5;
        let pad = SOURCE_PAD as f64;
        let forward = self.forward.shifted(
            Point::new(half - pad, half - pad),
            Point::new(-half, -half),
        );
        Projection::from_matrix(forward.to_matrix_f32()).ok_or_else(|| {
            DocflatError::InvalidGeometry("triangle warp is not invertible".into())
        })
    }
}

/// Warps a quadrilateral region of a source image into an upright rectangle.
///
/// Stateless apart from the background fill used wherever the output has no
/// source pixel behind it (outside the source extent).
#[derive(Debug, Clone, Copy)]
pub struct Rectifier {
    background: Rgba<u8>,
}

impl Default for Rectifier {
    fn default() -> Self {
        Self::new(Rgba([255, 255, 255, 255]))
    }
}

impl Rectifier {
    pub fn new(background: Rgba<u8>) -> Self {
        Self { background }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(Rgba(config.background))
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Output size: the longer of each pair of opposite edges, rounded.
    pub fn output_size(quad: &Quadrilateral) -> Result<(u32, u32)> {
        if !quad.is_finite() {
            return Err(DocflatError::InvalidGeometry(
                "quadrilateral has non-finite corners".into(),
            ));
        }
        let width = quad.max_width().round();
        let height = quad.max_height().round();
        if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(DocflatError::InvalidGeometry(format!(
                "output size {}x{} is not a drawable rectangle",
                width, height
            )));
        }
        let (width, height) = (width as u32, height as u32);
        let bytes = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_mul(4));
        match bytes {
            Some(bytes) if bytes <= MAX_OUTPUT_BYTES => Ok((width, height)),
            _ => Err(DocflatError::InvalidGeometry(format!(
                "output size {}x{} exceeds the {} byte limit",
                width, height, MAX_OUTPUT_BYTES
            ))),
        }
    }

    /// Solve both triangle warps for `quad` onto a `width` x `height` output.
    ///
    /// Triangle A is `(tl, tr, br)` and triangle B is `(tl, br, bl)`; they
    /// share the `tl`–`br` diagonal, so both solves agree along it.
    pub fn triangle_warps(quad: &Quadrilateral, width: u32, height: u32) -> Result<[TriangleWarp; 2]> {
        let (w, h) = (width as f64, height as f64);
        let (tl, tr, br, bl) = (
            quad.top_left(),
            quad.top_right(),
            quad.bottom_right(),
            quad.bottom_left(),
        );
        let out_tl = Point::new(0.0, 0.0);
        let out_tr = Point::new(w, 0.0);
        let out_br = Point::new(w, h);
        let out_bl = Point::new(0.0, h);

        let upper = TriangleWarp::solve(
            Triangle::new(tl, tr, br),
            Triangle::new(out_tl, out_tr, out_br),
        )?;
        let lower = TriangleWarp::solve(
            Triangle::new(tl, br, bl),
            Triangle::new(out_tl, out_br, out_bl),
        )?;
        Ok([upper, lower])
    }

    /// Flatten the `quad` region of `source` into a new rectangle.
    ///
    /// Fails with `InvalidGeometry` for non-finite corners, an output that is
    /// smaller than 1x1 or larger than [`MAX_OUTPUT_BYTES`], or a degenerate
    /// triangle. Only the two triangles actually warped are checked: three
    /// collinear corners are rejected when they form `(tl, tr, br)` or
    /// `(tl, br, bl)`, while a quad whose only collinear triple is
    /// `(tr, br, bl)` or `(tl, tr, bl)` still rectifies. No partial output is
    /// returned on failure.
    ///
    /// Output pixels are sampled at their centres. Samples whose centre maps
    /// inside the source use its edge pixels; only samples outside it take
    /// the background colour.
    #[instrument(skip(self, source), fields(src_w = source.width(), src_h = source.height()))]
    pub fn rectify(&self, source: &RgbaImage, quad: &Quadrilateral) -> Result<RectifiedImage> {
        let (width, height) = Self::output_size(quad)?;
        let warps = Self::triangle_warps(quad, width, height)?;
        let projections = [warps[0].projection()?, warps[1].projection()?];
        info!(width, height, "Rectifying quadrilateral");

        let mut output = RgbaImage::from_pixel(width, height, self.background);
        let Some(padded) = pad_edges(source) else {
            debug!("Empty source; output is all background");
            return Ok(RectifiedImage { image: output });
        };
        let mut scratch = RgbaImage::new(width, height);

        for (pass, (warp, projection)) in warps.iter().zip(&projections).enumerate() {
            warp_into(
                &padded,
                projection,
                Interpolation::Bilinear,
                self.background,
                &mut scratch,
            );

            let exclusive = (pass > 0).then_some(SHARED_DIAGONAL_EDGE);
            let written = composite_triangle(&scratch, &warp.dest, exclusive, &mut output);
            debug!(pass, written, "Triangle composited");
        }

        Ok(RectifiedImage { image: output })
    }
}

/// `source` surrounded by [`SOURCE_PAD`] copies of its outermost pixels, or
/// `None` for an empty source.
fn pad_edges(source: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let pad = SOURCE_PAD;
    Some(RgbaImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = x.saturating_sub(pad).min(width - 1);
        let sy = y.saturating_sub(pad).min(height - 1);
        *source.get_pixel(sx, sy)
    }))
}

/// Copy every pixel of `layer` whose centre lies inside `footprint` into
/// `output`. Returns the number of pixels written.
fn composite_triangle(
    layer: &RgbaImage,
    footprint: &Triangle,
    exclusive_edge: Option<usize>,
    output: &mut RgbaImage,
) -> u64 {
    let (min, max) = footprint.bounds();
    let x_start = min.x.floor().max(0.0) as u32;
    let y_start = min.y.floor().max(0.0) as u32;
    let x_end = (max.x.ceil().max(0.0) as u32).min(output.width());
    let y_end = (max.y.ceil().max(0.0) as u32).min(output.height());

    let mut written = 0;
    for y in y_start..y_end {
        for x in x_start..x_end {
            let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            if footprint.covers(centre, exclusive_edge) {
                output.put_pixel(x, y, *layer.get_pixel(x, y));
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: [(f64, f64); 4]) -> Quadrilateral {
        Quadrilateral::from_points(points.map(Point::from))
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    #[test]
    fn output_size_uses_longer_edges() {
        let q = quad([(100.0, 100.0), (900.0, 120.0), (880.0, 1300.0), (120.0, 1280.0)]);
        assert_eq!(Rectifier::output_size(&q).expect("valid"), (800, 1180));
    }

    #[test]
    fn tilted_page_inside_source_rectifies_to_edge_lengths() {
        let source = RgbaImage::from_pixel(1000, 1414, Rgba([0, 0, 0, 255]));
        let q = quad([(100.0, 100.0), (900.0, 120.0), (880.0, 1300.0), (120.0, 1280.0)]);
        let out = Rectifier::default().rectify(&source, &q).expect("rectify");

        assert_eq!((out.width(), out.height()), (800, 1180));
        // The page lies wholly inside the source, so no pixel is background.
        assert!(out.as_image().pixels().all(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn full_frame_keeps_last_row_and_column() {
        let source = RgbaImage::from_fn(20, 20, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 7, 255]));
        let q = quad([(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)]);
        let out = Rectifier::default().rectify(&source, &q).expect("rectify");

        assert_eq!(*out.as_image().get_pixel(19, 10), Rgba([190, 100, 7, 255]));
        assert_eq!(*out.as_image().get_pixel(10, 19), Rgba([100, 190, 7, 255]));
        assert_eq!(out.into_image(), source);
    }

    #[test]
    fn oversized_output_is_rejected_before_allocating() {
        let source = RgbaImage::new(10, 10);
        let huge = quad([(0.0, 0.0), (3e9, 0.0), (3e9, 3e9), (0.0, 3e9)]);
        assert!(matches!(
            Rectifier::default().rectify(&source, &huge),
            Err(DocflatError::InvalidGeometry(_))
        ));

        // 20000 x 20000 RGBA is 1.6 GB.
        let large = quad([(0.0, 0.0), (20000.0, 0.0), (20000.0, 20000.0), (0.0, 20000.0)]);
        assert!(matches!(
            Rectifier::output_size(&large),
            Err(DocflatError::InvalidGeometry(_))
        ));
        let fits = quad([(0.0, 0.0), (16000.0, 0.0), (16000.0, 16000.0), (0.0, 16000.0)]);
        assert_eq!(Rectifier::output_size(&fits).expect("fits"), (16000, 16000));
    }

    #[test]
    fn collinear_triple_outside_both_triangles_still_rectifies() {
        // tr, br and bl lie on one line, but (tl, tr, br) and (tl, br, bl)
        // both have area.
        let q = quad([(0.0, 10.0), (20.0, 0.0), (20.0, 20.0), (20.0, 40.0)]);
        let source = RgbaImage::from_pixel(64, 64, Rgba([9, 9, 9, 255]));
        assert!(Rectifier::default().rectify(&source, &q).is_ok());
    }

    #[test]
    fn corners_round_trip_through_inverse_maps() {
        let q = quad([(100.0, 100.0), (900.0, 120.0), (880.0, 1300.0), (120.0, 1280.0)]);
        let (w, h) = Rectifier::output_size(&q).expect("valid");
        let [upper, lower] = Rectifier::triangle_warps(&q, w, h).expect("solvable");
        let (w, h) = (w as f64, h as f64);

        assert_close(upper.inverse.apply(Point::new(0.0, 0.0)), q.top_left());
        assert_close(upper.inverse.apply(Point::new(w, 0.0)), q.top_right());
        assert_close(upper.inverse.apply(Point::new(w, h)), q.bottom_right());
        assert_close(lower.inverse.apply(Point::new(0.0, 0.0)), q.top_left());
        assert_close(lower.inverse.apply(Point::new(w, h)), q.bottom_right());
        assert_close(lower.inverse.apply(Point::new(0.0, h)), q.bottom_left());
    }

    #[test]
    fn diagonal_is_continuous_across_triangles() {
        let q = quad([(10.0, 12.0), (200.0, 5.0), (190.0, 300.0), (20.0, 280.0)]);
        let (w, h) = Rectifier::output_size(&q).expect("valid");
        let [upper, lower] = Rectifier::triangle_warps(&q, w, h).expect("solvable");
        for t in [0.25, 0.5, 0.75] {
            let p = Point::new(w as f64 * t, h as f64 * t);
            assert_close(upper.inverse.apply(p), lower.inverse.apply(p));
        }
    }

    #[test]
    fn collinear_corners_fail_without_output() {
        let q = quad([(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (0.0, 10.0)]);
        let source = RgbaImage::from_pixel(32, 32, Rgba([10, 20, 30, 255]));
        let err = Rectifier::default().rectify(&source, &q).unwrap_err();
        assert!(matches!(err, DocflatError::InvalidGeometry(_)));
    }

    #[test]
    fn non_finite_corner_is_invalid_geometry() {
        let q = quad([(0.0, 0.0), (10.0, 0.0), (10.0, f64::INFINITY), (0.0, 10.0)]);
        let source = RgbaImage::new(16, 16);
        let err = Rectifier::default().rectify(&source, &q).unwrap_err();
        assert!(matches!(err, DocflatError::InvalidGeometry(_)));
    }

    #[test]
    fn collapsed_quad_is_too_small() {
        let q = quad([(5.0, 5.0), (5.2, 5.0), (5.2, 5.2), (5.0, 5.2)]);
        assert!(matches!(
            Rectifier::output_size(&q),
            Err(DocflatError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn axis_aligned_quad_copies_the_region() {
        // Left half red, right half blue.
        let source = RgbaImage::from_fn(100, 60, |x, _| {
            if x < 50 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let q = quad([(20.0, 10.0), (80.0, 10.0), (80.0, 50.0), (20.0, 50.0)]);
        let out = Rectifier::default().rectify(&source, &q).expect("rectify");

        assert_eq!((out.width(), out.height()), (60, 40));
        assert_eq!(*out.as_image().get_pixel(5, 20), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.as_image().get_pixel(55, 20), Rgba([0, 0, 255, 255]));
        // Both triangles contributed.
        assert_eq!(*out.as_image().get_pixel(50, 5), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.as_image().get_pixel(5, 35), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn out_of_bounds_corners_sample_background() {
        let source = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        // Extends well past the right and bottom edges of the source.
        let q = quad([(0.0, 0.0), (120.0, 0.0), (120.0, 120.0), (0.0, 120.0)]);
        let out = Rectifier::default().rectify(&source, &q).expect("rectify");

        assert_eq!(*out.as_image().get_pixel(10, 10), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.as_image().get_pixel(110, 110), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.as_image().get_pixel(110, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn custom_background_fills_outside_source() {
        let source = RgbaImage::new(0, 0);
        let rectifier = Rectifier::new(Rgba([1, 2, 3, 255]));
        let q = quad([(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)]);
        let out = rectifier.rectify(&source, &q).expect("rectify");
        assert!(out.as_image().pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }
}
