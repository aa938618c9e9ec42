// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: source-space points, the ordered document quadrilateral,
// detector hypotheses, and the screen-to-source coordinate mapping.

use serde::{Deserialize, Serialize};

/// A point in source-image pixel coordinates (not screen coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One of the four ordered quadrilateral slots.
///
/// The discriminant is the slot's index in [`Quadrilateral::points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl Corner {
    /// All corners in quadrilateral order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a raw index (0..=3) to its corner.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Ordered four-point document boundary: `[top_left, top_right, bottom_right, bottom_left]`.
///
/// Order is significant: it decides which source edge lands on which edge of
/// the rectified output. The type always holds exactly four points; "no
/// quadrilateral yet" is expressed as `Option<Quadrilateral>` by its owners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    points: [Point; 4],
}

impl Quadrilateral {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            points: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    pub fn from_points(points: [Point; 4]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    pub fn corner(&self, corner: Corner) -> Point {
        self.points[corner.index()]
    }

    pub fn top_left(&self) -> Point {
        self.points[0]
    }

    pub fn top_right(&self) -> Point {
        self.points[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.points[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.points[3]
    }

    /// Copy of this quadrilateral with one corner replaced.
    pub fn with_corner(mut self, corner: Corner, point: Point) -> Self {
        self.points[corner.index()] = point;
        self
    }

    /// True when every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Point::is_finite)
    }

    /// Longer of the top and bottom edges.
    pub fn max_width(&self) -> f64 {
        let top = self.top_left().distance(&self.top_right());
        let bottom = self.bottom_left().distance(&self.bottom_right());
        top.max(bottom)
    }

    /// Longer of the left and right edges.
    pub fn max_height(&self) -> f64 {
        let left = self.top_left().distance(&self.bottom_left());
        let right = self.top_right().distance(&self.bottom_right());
        left.max(right)
    }
}

impl From<CornerHypothesis> for Quadrilateral {
    fn from(h: CornerHypothesis) -> Self {
        Self::new(
            h.top_left_corner,
            h.top_right_corner,
            h.bottom_right_corner,
            h.bottom_left_corner,
        )
    }
}

/// Four named corners as reported by an external document-boundary detector.
///
/// Field names serialize in camelCase (`topLeftCorner`, ...) to match the
/// detector's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerHypothesis {
    pub top_left_corner: Point,
    pub top_right_corner: Point,
    pub bottom_right_corner: Point,
    pub bottom_left_corner: Point,
}

/// A pointer position in screen (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub client_x: f64,
    pub client_y: f64,
}

impl ScreenPoint {
    pub const fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// Geometry of the rendering surface a pointer event was delivered to.
///
/// `left`/`top`/`display_*` describe the on-screen bounding box; `buffer_*`
/// is the size of the backing pixel buffer drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetrics {
    pub left: f64,
    pub top: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub buffer_width: f64,
    pub buffer_height: f64,
}

impl SurfaceMetrics {
    /// A surface shown at its natural size at the origin.
    pub fn unscaled(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            display_width: width,
            display_height: height,
            buffer_width: width,
            buffer_height: height,
        }
    }

    /// Display-to-buffer scale on each axis.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.buffer_width / self.display_width,
            self.buffer_height / self.display_height,
        )
    }

    /// Convert a screen-space pointer position into source-pixel space.
    ///
    /// Applies the display-to-buffer scale first, then removes `zoom`. Both
    /// hit testing and drag updates go through here so drags track the pointer.
    pub fn to_source(&self, screen: ScreenPoint, zoom: f64) -> Point {
        let (scale_x, scale_y) = self.scale();
        Point {
            x: (screen.client_x - self.left) * scale_x / zoom,
            y: (screen.client_y - self.top) * scale_y / zoom,
        }
    }
}
