// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner editor session — owns the decoded source, the live quadrilateral,
// the zoom factor and the drag state, and turns pointer input into corner
// moves.

use std::sync::Arc;

use image::RgbaImage;
use docflat_core::ScanConfig;
use docflat_core::error::{DocflatError, Result};
use docflat_core::types::{Corner, Point, Quadrilateral, ScreenPoint, SurfaceMetrics};
use tracing::{debug, info, instrument, warn};

use crate::editor::overlay::{OverlayStyle, render_overlay};
use crate::scan::rectify::{RectifiedImage, Rectifier};

/// Interactive state for correcting one captured frame.
///
/// Single owner, single writer: the hosting UI forwards pointer events
/// through the explicit drag methods. The source image never changes for
/// the life of the session; the quadrilateral changes only through
/// [`define_quadrilateral`](Self::define_quadrilateral) and the drag
/// protocol.
#[derive(Debug, Clone)]
pub struct EditorSession {
    source: Arc<RgbaImage>,
    quad: Option<Quadrilateral>,
    zoom: f64,
    dragging: Option<Corner>,
    pick_radius: f64,
    style: OverlayStyle,
}

impl EditorSession {
    // -- Construction ---------------------------------------------------------

    /// Bind a session to a decoded source image.
    ///
    /// `initial` (typically a detector's hypothesis) is adopted verbatim;
    /// without it the session starts with no quadrilateral and draws no
    /// overlay.
    pub fn init(source: Arc<RgbaImage>, initial: Option<Quadrilateral>) -> Self {
        Self::with_config(source, initial, &ScanConfig::default())
    }

    /// Like [`init`](Self::init), taking pick radius and overlay style from `config`.
    pub fn with_config(
        source: Arc<RgbaImage>,
        initial: Option<Quadrilateral>,
        config: &ScanConfig,
    ) -> Self {
        info!(
            width = source.width(),
            height = source.height(),
            seeded = initial.is_some(),
            "Editor session started"
        );
        Self {
            source,
            quad: initial,
            zoom: 1.0,
            dragging: None,
            pick_radius: config.pick_radius,
            style: OverlayStyle::from_config(config),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn source(&self) -> &Arc<RgbaImage> {
        &self.source
    }

    /// Snapshot of the current quadrilateral, or `None` if none is defined.
    pub fn quadrilateral(&self) -> Option<Quadrilateral> {
        self.quad
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The corner currently being dragged.
    pub fn dragging(&self) -> Option<Corner> {
        self.dragging
    }

    pub fn pick_radius(&self) -> f64 {
        self.pick_radius
    }

    // -- Mutation -------------------------------------------------------------

    /// Set the render scale. Must be finite and positive.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(DocflatError::InvalidZoom(zoom));
        }
        self.zoom = zoom;
        Ok(())
    }

    /// Replace the quadrilateral wholesale, e.g. when the user draws one on
    /// an unseeded session. Rejected while a drag is in progress.
    pub fn define_quadrilateral(&mut self, quad: Quadrilateral) -> Result<()> {
        if let Some(active) = self.dragging {
            return Err(DocflatError::DragInProgress(active));
        }
        self.quad = Some(quad);
        Ok(())
    }

    // -- Drag protocol --------------------------------------------------------

    /// The corner nearest to `screen` within the pick radius, if any.
    ///
    /// The radius is tested in source pixels, after the pointer has been
    /// mapped out of screen space, so it does not change with zoom.
    pub fn hit_test(&self, screen: ScreenPoint, surface: &SurfaceMetrics) -> Option<Corner> {
        let quad = self.quad.as_ref()?;
        let target = surface.to_source(screen, self.zoom);
        if !target.is_finite() {
            return None;
        }
        Corner::ALL
            .iter()
            .map(|&corner| (corner, quad.corner(corner).distance(&target)))
            .filter(|(_, distance)| *distance < self.pick_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(corner, _)| corner)
    }

    /// Start dragging `corner`.
    pub fn begin_drag(&mut self, corner: Corner) -> Result<()> {
        if let Some(active) = self.dragging {
            return Err(DocflatError::DragInProgress(active));
        }
        if self.quad.is_none() {
            return Err(DocflatError::NoQuadrilateral);
        }
        debug!(?corner, "Drag started");
        self.dragging = Some(corner);
        Ok(())
    }

    /// Start dragging the corner at raw index `index` (0..=3).
    pub fn begin_drag_index(&mut self, index: usize) -> Result<()> {
        let corner = Corner::from_index(index).ok_or(DocflatError::InvalidCorner(index))?;
        self.begin_drag(corner)
    }

    /// Move the dragged corner to the pointer. Returns the corner's new
    /// source-space position, or `None` when no drag is active.
    ///
    /// Positions are not clamped to the image; a corner may sit outside the
    /// frame and the rectifier fills whatever lies there with background.
    pub fn update_drag(&mut self, screen: ScreenPoint, surface: &SurfaceMetrics) -> Option<Point> {
        let corner = self.dragging?;
        let quad = self.quad?;
        let target = surface.to_source(screen, self.zoom);
        if !target.is_finite() {
            warn!(?screen, "Ignoring pointer position that maps to a non-finite point");
            return None;
        }
        self.quad = Some(quad.with_corner(corner, target));
        Some(target)
    }

    /// Stop dragging. Safe to call when no drag is active.
    pub fn end_drag(&mut self) {
        if let Some(corner) = self.dragging.take() {
            debug!(?corner, "Drag ended");
        }
    }

    // -- Pointer convenience --------------------------------------------------

    /// Pointer pressed: begin dragging the corner under the pointer, if any.
    pub fn pointer_down(&mut self, screen: ScreenPoint, surface: &SurfaceMetrics) -> Option<Corner> {
        if self.dragging.is_some() {
            return None;
        }
        let corner = self.hit_test(screen, surface)?;
        self.begin_drag(corner).ok()?;
        Some(corner)
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, screen: ScreenPoint, surface: &SurfaceMetrics) -> Option<Point> {
        self.update_drag(screen, surface)
    }

    /// Pointer released or left the surface.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    // -- Output ---------------------------------------------------------------

    /// Render the source at the current zoom with the quadrilateral overlay.
    pub fn render(&self) -> RgbaImage {
        render_overlay(&self.source, self.quad.as_ref(), self.zoom, &self.style)
    }

    /// Rectify the current quadrilateral. Never modifies the session, so a
    /// failure leaves the corners where the user put them.
    #[instrument(skip(self, rectifier))]
    pub fn rectify(&self, rectifier: &Rectifier) -> Result<RectifiedImage> {
        let quad = self.quad.ok_or(DocflatError::NoQuadrilateral)?;
        rectifier.rectify(&self.source, &quad)
    }
}
