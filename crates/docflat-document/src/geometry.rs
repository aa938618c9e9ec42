// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared 2-D geometry: signed triangle areas, point-in-triangle coverage and
// the closed-form three-point affine solve used by the rectifier.

use docflat_core::error::{DocflatError, Result};
use docflat_core::types::Point;

/// Twice-areas at or below this magnitude (in square pixels) are treated as
/// collinear. Far below one pixel, so any triangle a user can see passes.
pub const DEGENERATE_AREA_EPSILON: f64 = 1e-6;

/// Twice the signed area of triangle `abc`. Positive when `abc` turns
/// counter-clockwise in a y-up frame (clockwise on screen).
pub fn twice_signed_area(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// A triangle given by three ordered vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

impl Triangle {
    pub const fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    pub fn twice_signed_area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        twice_signed_area(a, b, c)
    }

    pub fn is_degenerate(&self) -> bool {
        let area = self.twice_signed_area();
        !area.is_finite() || area.abs() <= DEGENERATE_AREA_EPSILON
    }

    /// Inclusive point-in-triangle test; points on any edge count as inside.
    pub fn contains(&self, p: Point) -> bool {
        self.covers(p, None)
    }

    /// Point-in-triangle test where edge `exclusive_edge` (the edge from
    /// vertex `i` to vertex `i + 1`) does not count as inside.
    ///
    /// Two triangles sharing an edge, one of which excludes it, partition
    /// the plane around that edge with no point claimed twice.
    pub fn covers(&self, p: Point, exclusive_edge: Option<usize>) -> bool {
        let orientation = self.twice_signed_area().signum();
        if orientation == 0.0 {
            return false;
        }
        (0..3).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % 3];
            let side = twice_signed_area(a, b, p) * orientation;
            if exclusive_edge == Some(i) {
                side > 0.0
            } else {
                side >= 0.0
            }
        })
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Point, Point) {
        let [a, b, c] = self.vertices;
        (
            Point::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)),
            Point::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)),
        )
    }
}

/// 2-D affine map `x' = m11*x + m12*y + dx`, `y' = m21*x + m22*y + dy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl AffineTransform {
    pub const IDENTITY: Self = Self {
        m11: 1.0,
        m12: 0.0,
        m21: 0.0,
        m22: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Solve the unique affine map taking `from[i]` to `to[i]` for i in 0..3.
    ///
    /// Closed-form Cramer's-rule expansion. The shared denominator is twice
    /// the signed area of `from`; a (near) zero area has no solution and is
    /// reported as `InvalidGeometry` instead of producing non-finite
    /// coefficients.
    pub fn from_triangles(from: &Triangle, to: &Triangle) -> Result<Self> {
        let [s0, s1, s2] = from.vertices;
        let [d0, d1, d2] = to.vertices;

        if !(s0.is_finite() && s1.is_finite() && s2.is_finite()) {
            return Err(DocflatError::InvalidGeometry(
                "triangle has non-finite vertices".into(),
            ));
        }

        let denom = s0.x * (s1.y - s2.y) + s1.x * (s2.y - s0.y) + s2.x * (s0.y - s1.y);
        if !denom.is_finite() || denom.abs() <= DEGENERATE_AREA_EPSILON {
            return Err(DocflatError::InvalidGeometry(format!(
                "triangle ({:.2}, {:.2}) ({:.2}, {:.2}) ({:.2}, {:.2}) has zero area",
                s0.x, s0.y, s1.x, s1.y, s2.x, s2.y
            )));
        }

        // Cofactors shared by the x and y rows.
        let c_x = [s1.y - s2.y, s2.y - s0.y, s0.y - s1.y];
        let c_y = [s2.x - s1.x, s0.x - s2.x, s1.x - s0.x];
        let c_t = [
            s1.x * s2.y - s2.x * s1.y,
            s2.x * s0.y - s0.x * s2.y,
            s0.x * s1.y - s1.x * s0.y,
        ];
        let row = |t0: f64, t1: f64, t2: f64, c: &[f64; 3]| (t0 * c[0] + t1 * c[1] + t2 * c[2]) / denom;

        let transform = Self {
            m11: row(d0.x, d1.x, d2.x, &c_x),
            m12: row(d0.x, d1.x, d2.x, &c_y),
            m21: row(d0.y, d1.y, d2.y, &c_x),
            m22: row(d0.y, d1.y, d2.y, &c_y),
            dx: row(d0.x, d1.x, d2.x, &c_t),
            dy: row(d0.y, d1.y, d2.y, &c_t),
        };

        if !transform.is_finite() {
            return Err(DocflatError::InvalidGeometry(
                "affine solve produced non-finite coefficients".into(),
            ));
        }
        Ok(transform)
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.m11 * p.x + self.m12 * p.y + self.dx,
            self.m21 * p.x + self.m22 * p.y + self.dy,
        )
    }

    /// The map `p -> self(p + input) + output`.
    ///
    /// Used to move between pixel-index and pixel-centre conventions, or
    /// into a padded buffer, without re-solving.
    pub fn shifted(&self, input: Point, output: Point) -> Self {
        Self {
            dx: self.m11 * input.x + self.m12 * input.y + self.dx + output.x,
            dy: self.m21 * input.x + self.m22 * input.y + self.dy + output.y,
            ..*self
        }
    }

    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    pub fn is_finite(&self) -> bool {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Row-major 3x3 homogeneous matrix, as `imageproc` projections expect.
    pub fn to_matrix_f32(&self) -> [f32; 9] {
        [
            self.m11 as f32,
            self.m12 as f32,
            self.dx as f32,
            self.m21 as f32,
            self.m22 as f32,
            self.dy as f32,
            0.0,
            0.0,
            1.0,
        ]
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    #[test]
    fn signed_area_of_unit_right_triangle() {
        let area = twice_signed_area(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        );
        assert_eq!(area, 1.0);
    }

    #[test]
    fn affine_solve_maps_each_vertex() {
        let from = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(800.0, 0.0),
            Point::new(800.0, 1180.0),
        );
        let to = Triangle::new(
            Point::new(100.0, 100.0),
            Point::new(900.0, 120.0),
            Point::new(880.0, 1300.0),
        );
        let t = AffineTransform::from_triangles(&from, &to).expect("solvable");
        for (f, d) in from.vertices.iter().zip(to.vertices.iter()) {
            assert_close(t.apply(*f), *d);
        }
    }

    #[test]
    fn affine_solve_of_identical_triangles_is_identity() {
        let tri = Triangle::new(
            Point::new(3.0, 4.0),
            Point::new(10.0, 2.0),
            Point::new(6.0, 9.0),
        );
        let t = AffineTransform::from_triangles(&tri, &tri).expect("solvable");
        assert!((t.m11 - 1.0).abs() < 1e-12);
        assert!(t.m12.abs() < 1e-12);
        assert!(t.m21.abs() < 1e-12);
        assert!((t.m22 - 1.0).abs() < 1e-12);
        assert!(t.dx.abs() < 1e-9 && t.dy.abs() < 1e-9);
    }

    #[test]
    fn collinear_source_is_rejected() {
        let from = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        );
        let to = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        );
        let err = AffineTransform::from_triangles(&from, &to).unwrap_err();
        assert!(matches!(err, DocflatError::InvalidGeometry(_)));
    }

    #[test]
    fn nan_vertex_is_rejected() {
        let from = Triangle::new(
            Point::new(f64::NAN, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        );
        let err = AffineTransform::from_triangles(&from, &from).unwrap_err();
        assert!(matches!(err, DocflatError::InvalidGeometry(_)));
    }

    #[test]
    fn contains_is_orientation_agnostic() {
        let cw = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        );
        let ccw = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        );
        let inside = Point::new(8.0, 2.0);
        let outside = Point::new(2.0, 8.0);
        assert!(cw.contains(inside) && ccw.contains(inside));
        assert!(!cw.contains(outside) && !ccw.contains(outside));
    }

    #[test]
    fn exclusive_edge_splits_shared_diagonal() {
        let a = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        );
        let b = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        );
        let on_diagonal = Point::new(5.0, 5.0);
        assert!(a.covers(on_diagonal, None));
        assert!(!b.covers(on_diagonal, Some(0)));
        assert!(b.covers(Point::new(2.0, 8.0), Some(0)));
    }

    #[test]
    fn shifted_offsets_input_and_output() {
        let t = AffineTransform {
            m11: 2.0,
            m12: 0.0,
            m21: 0.0,
            m22: 3.0,
            dx: 1.0,
            dy: -1.0,
        };
        let shifted = t.shifted(Point::new(-0.5, 1.0), Point::new(0.25, 0.0));
        let p = Point::new(4.0, 2.0);
        let expected = t.apply(Point::new(3.5, 3.0));
        assert_eq!(shifted.apply(p), Point::new(expected.x + 0.25, expected.y));
        assert_eq!(shifted.determinant(), t.determinant());
    }

    #[test]
    fn degenerate_triangle_contains_nothing() {
        let line = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 10.0),
        );
        assert!(line.is_degenerate());
        assert!(!line.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn matrix_layout_is_row_major() {
        let t = AffineTransform {
            m11: 1.0,
            m12: 2.0,
            m21: 3.0,
            m22: 4.0,
            dx: 5.0,
            dy: 6.0,
        };
        assert_eq!(
            t.to_matrix_f32(),
            [1.0, 2.0, 5.0, 3.0, 4.0, 6.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(t.determinant(), -2.0);
    }
}
